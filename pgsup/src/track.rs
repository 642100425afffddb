/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! The user-facing frame layer on top of the display set list.
//!
//! A frame is one subtitle the user actually sees: an epoch-start display set opens it, and
//! the next clear frame closes it by supplying the end timestamp. Acquisition points and
//! non-clearing normal updates exist for players seeking mid-stream and are skipped here.
//!
//! Frames live for the lifetime of the loaded track. OCR output or manual edits attach text
//! to them via [`SupTrack::set_text`]; [`SupTrack::text_blocks`] then yields the tuples an
//! external plain-text subtitle writer consumes.


use std::fs;
use std::io::Error as IoError;
use std::path::Path;

use log::{debug, warn};
use thiserror::Error as ThisError;

use crate::displayset::{assemble_display_sets, DisplaySet};
use crate::format_timestamp;
use crate::render::{Bitmap, RenderOptions};
use crate::segment::{CompositionState, SegmentReader};
use crate::timeline::{build_entries, SubtitleEntry};

#[derive(ThisError, Debug)]
pub enum DecodeError {
    #[error("could not read subtitle stream")]
    Io {
        #[from]
        source: IoError,
    },
}

/// One subtitle as shown to the user.
#[derive(Clone, Debug)]
pub struct Frame {
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    text: Vec<String>,
    /// Index of the owning track's display set this frame renders from.
    display_set: usize,
}

impl Frame {

    /// Text lines attached by OCR or manual editing; empty until assigned.
    pub fn text(&self) -> &[String] {
        &self.text
    }

    /// PGS frames always carry an image rather than native text.
    pub fn image_based(&self) -> bool {
        true
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// A fully decoded PGS subtitle track.
pub struct SupTrack {
    display_sets: Vec<DisplaySet>,
    entries: Vec<SubtitleEntry>,
    frames: Vec<Frame>,
    options: RenderOptions,
}

impl SupTrack {

    /// Reads and decodes a `.sup` file.
    ///
    /// Failing to read the file is the only hard error; malformed content degrades to a
    /// track with fewer (or zero) frames.
    pub fn load(path: &Path, options: RenderOptions) -> Result<Self, DecodeError> {
        let data = fs::read(path)?;
        Ok(Self::from_bytes(&data, options))
    }

    /// Decodes an in-memory PGS byte stream.
    pub fn from_bytes(data: &[u8], options: RenderOptions) -> Self {
        let display_sets = assemble_display_sets(SegmentReader::new(data));
        let entries = build_entries(&display_sets);
        let frames = pair_frames(&display_sets);
        Self {
            display_sets,
            entries,
            frames,
            options,
        }
    }

    pub fn display_sets(&self) -> &[DisplaySet] {
        &self.display_sets
    }

    pub fn display_set(&self, index: usize) -> Option<&DisplaySet> {
        self.display_sets.get(index)
    }

    /// The raw timing chain, one entry per display set.
    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Attaches text lines to a frame, trimming whitespace and dropping empty lines.
    ///
    /// Returns false when no such frame exists.
    pub fn set_text(&mut self, index: usize, lines: &[String]) -> bool {
        match self.frames.get_mut(index) {
            Some(frame) => {
                frame.text = lines
                    .iter()
                    .map(|line| line.trim().to_owned())
                    .filter(|line| !line.is_empty())
                    .collect();
                true
            }
            None => false,
        }
    }

    /// The frame's rendered bitmap, computed on first access and cached on the display set.
    pub fn image(&self, index: usize) -> Option<&Bitmap> {
        let frame = self.frames.get(index)?;
        let set = self.display_sets.get(frame.display_set)?;
        Some(set.image(&self.options))
    }

    /// Emits `(start_ms, end_ms, lines)` tuples for an external plain-text subtitle writer,
    /// in increasing start order.
    ///
    /// Frames with no text and frames whose start does not advance past the previously
    /// emitted one are skipped, each with a log entry.
    pub fn text_blocks(&self) -> Vec<(u64, u64, &[String])> {

        let mut blocks = Vec::new();
        let mut last_start: Option<u64> = None;

        for frame in &self.frames {
            if frame.text.is_empty() {
                warn!(
                    "skipping frame {} with no text at {}",
                    frame.index,
                    format_timestamp(frame.start_ms),
                );
                continue
            }
            if last_start.map_or(false, |previous| frame.start_ms <= previous) {
                warn!(
                    "skipping out-of-order frame {} at {}",
                    frame.index,
                    format_timestamp(frame.start_ms),
                );
                continue
            }
            blocks.push((frame.start_ms, frame.end_ms, frame.text.as_slice()));
            last_start = Some(frame.start_ms);
        }

        blocks
    }
}

fn pair_frames(sets: &[DisplaySet]) -> Vec<Frame> {

    let mut frames: Vec<Frame> = Vec::new();
    let mut open: Option<usize> = None;

    for (set_index, set) in sets.iter().enumerate() {
        match set.composition.composition_state {
            CompositionState::EpochStart => {
                let start_ms = set.timestamp_ms();
                frames.push(
                    Frame {
                        index: frames.len(),
                        start_ms,
                        end_ms: start_ms,
                        text: Vec::new(),
                        display_set: set_index,
                    }
                );
                open = Some(frames.len() - 1);
            }
            CompositionState::Normal if set.is_clear_frame() => {
                if let Some(index) = open.take() {
                    frames[index].end_ms = set.timestamp_ms();
                }
            }
            CompositionState::AcquisitionPoint => {
                debug!(
                    "skipped acquisition point display set {}",
                    set.composition.composition_number,
                );
            }
            CompositionState::Normal => {
                debug!(
                    "skipped normal case display set {}",
                    set.composition.composition_number,
                );
            }
        }
    }

    frames
}
