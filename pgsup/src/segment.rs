/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Operates on individual segments.
//!
//! # Overview
//!
//! A segment is the most fundamental data structure within a PGS bitstream. Multiple segments
//! come together in a well-defined manner to form a display set (DS).
//!
//! There are five types that typically appear in this order:
//!
//! 1. Presentation Composition Segment (PCS)
//! 2. Window Definition Segment (WDS)
//! 3. Palette Definition Segment (PDS)
//! 4. Object Definition Segment (ODS)
//! 5. End Segment (ES)
//!
//! [`SegmentReader`] splits the raw byte stream into [`RawSegment`] values without looking at
//! the payloads, recovering from corruption along the way. [`Segment::parse`] then interprets
//! one payload into typed fields, rejecting payloads that violate the per-type length
//! invariants. The two stages are deliberately separate so that a single bad segment never
//! costs more than itself.

#[cfg(test)]
mod tests;

mod read;

pub use read::*;

use std::io::{Cursor, Error as IoError, Read};

use byteorder::{BigEndian, ReadBytesExt};
use log::debug;
use thiserror::Error as ThisError;

/// Magic marker opening every segment header.
pub const MAGIC: [u8; 2] = [0x50, 0x47]; // "PG"

/// Segment kind byte for a Palette Definition Segment.
pub const KIND_PDS: u8 = 0x14;
/// Segment kind byte for an Object Definition Segment.
pub const KIND_ODS: u8 = 0x15;
/// Segment kind byte for a Presentation Composition Segment.
pub const KIND_PCS: u8 = 0x16;
/// Segment kind byte for a Window Definition Segment.
pub const KIND_WDS: u8 = 0x17;
/// Segment kind byte for an End Segment.
pub const KIND_END: u8 = 0x80;

pub type SegmentResult<T> = Result<T, SegmentError>;

#[derive(ThisError, Debug)]
pub enum SegmentError {
    #[error("segment payload ended unexpectedly")]
    Truncated {
        #[from]
        source: IoError,
    },
    #[error("segment has unrecognized kind {kind:#04x}")]
    UnrecognizedKind { kind: u8 },
    #[error("presentation composition segment has invalid length {length}")]
    InvalidCompositionLength { length: usize },
    #[error("presentation composition segment has unrecognized state {state:#04x}")]
    UnrecognizedCompositionState { state: u8 },
    #[error("window definition segment has invalid length {length}")]
    InvalidWindowLength { length: usize },
    #[error("palette definition segment has invalid length {length}")]
    InvalidPaletteLength { length: usize },
    #[error("object definition segment has invalid length {length}")]
    InvalidObjectLength { length: usize },
}

/// A segment as it appears on the wire: a kind byte, a timestamp, and an opaque payload.
///
/// Only bytes [2:6] of the 13-byte header carry a usable timestamp; bytes [6:10] duplicate it
/// in practice and are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawSegment {
    pub kind: u8,
    /// Presentation timestamp in 90 kHz ticks.
    pub pts: u32,
    /// Byte offset of the segment header within the stream, for diagnostics.
    pub offset: u64,
    pub payload: Vec<u8>,
}

/// A fully decoded segment payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// A PCS, marking the beginning of a display set.
    PresentationComposition(PresentationCompositionSegment),
    /// A WDS, declaring the screen areas the display set composes into.
    WindowDefinition(WindowDefinitionSegment),
    /// A PDS, declaring an indexed color table.
    PaletteDefinition(PaletteDefinitionSegment),
    /// An ODS, carrying one fragment of run-length encoded pixel data.
    ObjectDefinition(ObjectDefinitionSegment),
    /// An ES, closing the current display set.
    End,
}

impl Segment {
    /// Decodes a raw segment's payload into typed fields.
    ///
    /// Length invariants are checked up front; a payload that violates them yields an error
    /// and should be dropped by the caller without affecting sibling segments.
    pub fn parse(raw: &RawSegment) -> SegmentResult<Segment> {
        Ok(match raw.kind {
            KIND_PDS => Segment::PaletteDefinition(parse_pds(&raw.payload)?),
            KIND_ODS => Segment::ObjectDefinition(parse_ods(&raw.payload)?),
            KIND_PCS => Segment::PresentationComposition(parse_pcs(&raw.payload)?),
            KIND_WDS => Segment::WindowDefinition(parse_wds(&raw.payload)?),
            KIND_END => Segment::End,
            kind => return Err(SegmentError::UnrecognizedKind { kind }),
        })
    }
}

/// Defines the role of a PCS (and thereby the associated DS) within an epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompositionState {
    /// The associated DS defines the start of a new epoch and carries everything needed to
    /// render its composition.
    EpochStart,
    /// The associated DS refreshes the current composition so that a player seeking into the
    /// middle of an epoch can still show it.
    AcquisitionPoint,
    /// The associated DS updates the composition on screen. A `Normal` DS with no composition
    /// objects clears the screen.
    Normal,
}

impl Default for CompositionState {
    fn default() -> Self { Self::EpochStart }
}

/// Defines a Presentation Composition Segment (PCS).
///
/// A PCS marks the beginning of a display set (DS).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresentationCompositionSegment {
    /// The width of the display in pixels.
    pub width: u16,
    /// The height of the display in pixels.
    pub height: u16,
    /// Nominally the frame rate; always `0x10` in practice and ignored.
    pub frame_rate: u8,
    /// Incremented by one for every graphics update.
    pub composition_number: u16,
    pub composition_state: CompositionState,
    /// Whether this PCS describes a palette-only display update.
    pub palette_update: bool,
    /// The palette to use when rendering this composition.
    pub palette_id: u8,
    pub composition_objects: Vec<CompositionObject>,
}

/// Maps an object into a window at a screen position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositionObject {
    pub object_id: u16,
    pub window_id: u8,
    pub x: u16,
    pub y: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowDefinitionSegment {
    pub windows: Vec<WindowDefinition>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowDefinition {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaletteDefinitionSegment {
    pub id: u8,
    /// Version of this palette within the epoch.
    pub version: u8,
    pub entries: Vec<PaletteEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaletteEntry {
    pub id: u8,
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

/// One fragment of an object's run-length encoded pixel data.
///
/// Large objects span multiple ODS fragments sharing an object ID; their `data` buffers
/// concatenate in arrival order to form one logical RLE stream. Only the first fragment
/// carries the size header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectDefinitionSegment {
    pub id: u16,
    pub version: u8,
    pub first_in_sequence: bool,
    pub last_in_sequence: bool,
    /// Present on the first fragment only.
    pub header: Option<ObjectHeader>,
    /// Raw RLE bytes carried by this fragment.
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectHeader {
    /// Total RLE byte length across all fragments, with the 4-byte size header already
    /// subtracted.
    pub declared_length: usize,
    pub width: u16,
    pub height: u16,
}

fn parse_pcs(payload: &[u8]) -> SegmentResult<PresentationCompositionSegment> {

    let length = payload.len();

    if length < 11 || (length - 11) % 8 != 0 {
        return Err(SegmentError::InvalidCompositionLength { length })
    }

    let mut input = Cursor::new(payload);
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let frame_rate = input.read_u8()?;
    let composition_number = input.read_u16::<BigEndian>()?;
    let composition_state = match input.read_u8()? {
        0x00 => CompositionState::Normal,
        0x40 => CompositionState::AcquisitionPoint,
        0x80 => CompositionState::EpochStart,
        state => return Err(SegmentError::UnrecognizedCompositionState { state }),
    };
    let palette_update = input.read_u8()? == 0x80;
    let palette_id = input.read_u8()?;
    let declared_count = input.read_u8()? as usize;
    let mut composition_objects = Vec::new();
    let mut pos = 11;

    while composition_objects.len() < declared_count && length - pos >= 8 {

        let object_id = input.read_u16::<BigEndian>()?;
        let window_id = input.read_u8()?;
        let cropped = input.read_u8()? == 0x40;
        let x = input.read_u16::<BigEndian>()?;
        let y = input.read_u16::<BigEndian>()?;

        pos += 8;

        // Cropped entries carry 8 further bytes of cropping coordinates. They are parsed
        // past but never applied. Some discs set the crop flag and then end the payload, so
        // the extra bytes cannot be assumed present.
        if cropped && length - pos >= 8 {
            let mut crop = [0u8; 8];
            input.read_exact(&mut crop)?;
            pos += 8;
        }

        composition_objects.push(
            CompositionObject {
                object_id,
                window_id,
                x,
                y,
            }
        );
    }

    Ok(
        PresentationCompositionSegment {
            width,
            height,
            frame_rate,
            composition_number,
            composition_state,
            palette_update,
            palette_id,
            composition_objects,
        }
    )
}

fn parse_wds(payload: &[u8]) -> SegmentResult<WindowDefinitionSegment> {

    let length = payload.len();

    if length < 10 || length % 9 != 1 {
        return Err(SegmentError::InvalidWindowLength { length })
    }

    let mut input = Cursor::new(payload);
    let declared_count = input.read_u8()? as usize;
    let count = (length - 1) / 9;

    if declared_count != count {
        debug!("window count field {} disagrees with payload length", declared_count);
    }

    let mut windows = Vec::new();

    for _ in 0..count {
        windows.push(
            WindowDefinition {
                id: input.read_u8()?,
                x: input.read_u16::<BigEndian>()?,
                y: input.read_u16::<BigEndian>()?,
                width: input.read_u16::<BigEndian>()?,
                height: input.read_u16::<BigEndian>()?,
            }
        );
    }

    Ok(WindowDefinitionSegment { windows })
}

fn parse_pds(payload: &[u8]) -> SegmentResult<PaletteDefinitionSegment> {

    let length = payload.len();

    if length < 7 || length % 5 != 2 {
        return Err(SegmentError::InvalidPaletteLength { length })
    }

    let mut input = Cursor::new(payload);
    let id = input.read_u8()?;
    let version = input.read_u8()?;
    let count = (length - 2) / 5;
    let mut entries = Vec::new();

    for _ in 0..count {

        // Record order is Y, Cr, Cb, not the Y, Cb, Cr most YCbCr layouts use.
        let id = input.read_u8()?;
        let y = input.read_u8()?;
        let cr = input.read_u8()?;
        let cb = input.read_u8()?;
        let alpha = input.read_u8()?;

        entries.push(PaletteEntry { id, y, cr, cb, alpha });
    }

    Ok(
        PaletteDefinitionSegment {
            id,
            version,
            entries,
        }
    )
}

fn parse_ods(payload: &[u8]) -> SegmentResult<ObjectDefinitionSegment> {

    let length = payload.len();

    if length < 4 {
        return Err(SegmentError::InvalidObjectLength { length })
    }

    let mut input = Cursor::new(payload);
    let id = input.read_u16::<BigEndian>()?;
    let version = input.read_u8()?;
    let sequence = input.read_u8()?;
    let first_in_sequence = sequence & 0x80 != 0;
    let last_in_sequence = sequence & 0x40 != 0;

    let (header, data) = if first_in_sequence {
        if length < 11 {
            return Err(SegmentError::InvalidObjectLength { length })
        }
        // The declared length counts the 4-byte size header that follows it.
        let declared_length = (input.read_u24::<BigEndian>()? as usize).saturating_sub(4);
        let width = input.read_u16::<BigEndian>()?;
        let height = input.read_u16::<BigEndian>()?;
        (
            Some(ObjectHeader { declared_length, width, height }),
            payload[11..].to_vec(),
        )
    } else {
        // Continuation fragments repeat the id/version/sequence fields and then carry RLE
        // data straight away.
        (None, payload[4..].to_vec())
    };

    Ok(
        ObjectDefinitionSegment {
            id,
            version,
            first_in_sequence,
            last_in_sequence,
            header,
            data,
        }
    )
}
