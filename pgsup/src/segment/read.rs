/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{RawSegment, MAGIC};

use byteorder::{BigEndian, ByteOrder};
use log::warn;

const HEADER_SIZE: usize = 13;

/// Splits a PGS byte stream into raw segments.
///
/// This is a finite, single-pass iterator. It performs no semantic validation; that is left
/// to [`Segment::parse`](super::Segment::parse). Corruption degrades the output instead of
/// failing it:
///
/// - A header whose magic marker is not `"PG"` advances the stream by exactly one byte and
///   retries, so a valid header is never skipped over.
/// - Fewer than 13 bytes remaining ends the stream (truncated trailer).
/// - A payload shorter than its declared length ends the stream.
///
/// Every recovery path is logged with the byte offset it happened at.
pub struct SegmentReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SegmentReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl Iterator for SegmentReader<'_> {

    type Item = RawSegment;

    fn next(&mut self) -> Option<RawSegment> {

        let data = self.data;
        let mut skipped = 0_usize;

        loop {

            let remaining = data.len() - self.pos;

            if remaining < HEADER_SIZE {
                if skipped > 0 {
                    warn!("skipped {} corrupt bytes at end of stream", skipped);
                } else if remaining > 0 {
                    warn!(
                        "truncated {}-byte segment header at offset {}",
                        remaining, self.pos,
                    );
                }
                self.pos = data.len();
                return None
            }

            if data[self.pos..self.pos + 2] != MAGIC {
                self.pos += 1;
                skipped += 1;
                continue
            }

            if skipped > 0 {
                warn!(
                    "resynchronized at offset {} after skipping {} bytes",
                    self.pos, skipped,
                );
            }

            let pts = BigEndian::read_u32(&data[self.pos + 2..self.pos + 6]);
            let kind = data[self.pos + 10];
            let size = BigEndian::read_u16(&data[self.pos + 11..self.pos + 13]) as usize;
            let start = self.pos + HEADER_SIZE;

            if start + size > data.len() {
                warn!(
                    "segment payload at offset {} truncated: declared {} bytes, {} available",
                    self.pos,
                    size,
                    data.len() - start,
                );
                self.pos = data.len();
                return None
            }

            let segment = RawSegment {
                kind,
                pts,
                offset: self.pos as u64,
                payload: data[start..start + size].to_vec(),
            };

            self.pos = start + size;

            return Some(segment)
        }
    }
}
