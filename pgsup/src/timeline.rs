/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Derives subtitle entries from the ordered display set list.
//!
//! Every display set contributes one entry whose start is its own timestamp and whose end is
//! the next set's timestamp, whatever kind that next set is. Clear frames therefore never
//! surface as content but still supply the end time of whatever precedes them.


use crate::displayset::DisplaySet;
use crate::segment::CompositionState;

/// One link in the subtitle timing chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubtitleEntry {
    /// Index of the display set this entry was derived from.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Whether the underlying composition opens a new epoch.
    pub epoch_start: bool,
    /// Whether the underlying set clears the screen. Clear frames are chain links only and
    /// should not be shown as entries.
    pub clear_frame: bool,
}

/// Builds the raw entry chain, one entry per display set.
///
/// The terminal entry has no successor to take an end time from, so its end stays equal to
/// its start.
pub fn build_entries(sets: &[DisplaySet]) -> Vec<SubtitleEntry> {

    let mut entries: Vec<SubtitleEntry> = Vec::with_capacity(sets.len());

    for (index, set) in sets.iter().enumerate() {

        let start_ms = set.timestamp_ms();

        if let Some(previous) = entries.last_mut() {
            previous.end_ms = start_ms;
        }

        entries.push(
            SubtitleEntry {
                index,
                start_ms,
                end_ms: start_ms,
                epoch_start: set.composition.composition_state == CompositionState::EpochStart,
                clear_frame: set.is_clear_frame(),
            }
        );
    }

    entries
}

/// The filtered view of [`build_entries`] output: content entries only, clear frames
/// withheld.
pub fn visible_entries(entries: &[SubtitleEntry]) -> impl Iterator<Item = &SubtitleEntry> {
    entries.iter().filter(|entry| !entry.clear_frame)
}
