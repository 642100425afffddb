/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Decodes Presentation Graphic Stream (PGS) subtitles as found in `.sup` files ripped from
//! Blu-ray discs.
//!
//! # Overview
//!
//! A PGS bitstream is a flat sequence of length-delimited segments with no index. Segments
//! group into display sets (DS), each one describing a single change to what is on screen.
//! This crate reads the whole stream in one forward pass and exposes three progressively
//! higher-level views of it:
//!
//! 1. [`segment`] splits the byte stream into typed segments, resynchronizing byte-by-byte
//!    across corrupt regions.
//! 2. [`displayset`] groups consecutive segments into display sets, discarding sets that are
//!    structurally unusable.
//! 3. [`timeline`] and [`track`] derive user-facing subtitle entries and frames from the
//!    ordered display set list, pairing content-bearing sets with the clearing sets that
//!    follow them.
//!
//! Bitmaps are rendered on demand per display set by [`render`] and cached, since decoding
//! the run-length encoded object data is the expensive part.
//!
//! Malformed input never aborts a decode. Corruption is logged and skipped, invalid segments
//! and display sets are dropped, and the result degrades to whatever could be recovered.
//! The only hard failure is being unable to read the input at all.

pub mod displayset;
pub mod mediainfo;
pub mod palette;
pub mod render;
pub mod segment;
pub mod timeline;
pub mod track;

pub use displayset::{assemble_display_sets, DisplaySet};
pub use render::{render, Bitmap, RenderOptions};
pub use segment::{RawSegment, Segment, SegmentReader};
pub use timeline::{build_entries, visible_entries, SubtitleEntry};
pub use track::{DecodeError, Frame, SupTrack};

/// PGS timestamps tick at 90 kHz.
pub const TICKS_PER_MS: u64 = 90;

/// Formats a millisecond timestamp as `HH:MM:SS,mmm`.
pub fn format_timestamp(ms: u64) -> String {
    let seconds = ms / 1_000;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        seconds / 3_600,
        seconds % 3_600 / 60,
        seconds % 60,
        ms % 1_000,
    )
}
