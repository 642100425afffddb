/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Groups consecutive segments into display sets.
//!
//! A display set (DS) opens with a presentation composition segment, accumulates window,
//! palette, and object segments, and closes with an end segment. A closed set needs at least
//! one window to be usable; anything else is discarded with a log entry rather than aborting
//! the parse.


use std::collections::BTreeMap;

use log::warn;
use once_cell::sync::OnceCell;

use crate::render::{render, Bitmap, RenderOptions};
use crate::segment::{
    CompositionState,
    ObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PresentationCompositionSegment,
    RawSegment,
    Segment,
};

/// A screen area the display set composes objects into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Window {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// One composition and everything needed to render it.
///
/// Once assembled a display set is immutable. Its bitmap is rendered on first access and
/// cached for the lifetime of the set.
#[derive(Clone, Debug)]
pub struct DisplaySet {
    /// Presentation timestamp in 90 kHz ticks.
    pub pts: u32,
    pub composition: PresentationCompositionSegment,
    pub windows: BTreeMap<u8, Window>,
    pub palettes: BTreeMap<u8, PaletteDefinitionSegment>,
    /// Object fragments in arrival order, keyed by object ID.
    pub objects: BTreeMap<u16, Vec<ObjectDefinitionSegment>>,
    image: OnceCell<Bitmap>,
}

impl DisplaySet {

    pub(crate) fn new(pts: u32, composition: PresentationCompositionSegment) -> Self {
        Self {
            pts,
            composition,
            windows: BTreeMap::new(),
            palettes: BTreeMap::new(),
            objects: BTreeMap::new(),
            image: OnceCell::new(),
        }
    }

    /// Whether this set clears the screen: a `Normal` composition with no objects.
    pub fn is_clear_frame(&self) -> bool {
        self.composition.composition_state == CompositionState::Normal
            && self.composition.composition_objects.is_empty()
    }

    /// Presentation timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        u64::from(self.pts) / crate::TICKS_PER_MS
    }

    /// Returns the rendered bitmap, computing it on first access.
    ///
    /// The options of the first call win; later calls return the cached image unchanged.
    pub fn image(&self, options: &RenderOptions) -> &Bitmap {
        self.image.get_or_init(|| render(self, options))
    }
}

/// Assembles an ordered segment stream into the ordered list of valid display sets.
///
/// Stream order is temporal order, so no sorting happens here. Invalid segments cost only
/// themselves; invalid display sets are discarded whole. Neither aborts assembly.
pub fn assemble_display_sets<I>(segments: I) -> Vec<DisplaySet>
where
    I: IntoIterator<Item = RawSegment>,
{
    let mut sets = Vec::new();
    let mut current: Option<DisplaySet> = None;

    for raw in segments {

        let segment = match Segment::parse(&raw) {
            Ok(segment) => segment,
            Err(err) => {
                warn!("dropping segment at offset {}: {}", raw.offset, err);
                continue
            }
        };

        match segment {
            Segment::PresentationComposition(pcs) => {
                if current.take().is_some() {
                    warn!(
                        "unexpected composition at offset {}; abandoning unfinished display set",
                        raw.offset,
                    );
                }
                current = Some(DisplaySet::new(raw.pts, pcs));
            }
            Segment::WindowDefinition(wds) => match current.as_mut() {
                Some(set) => {
                    for wd in wds.windows {
                        set.windows.insert(
                            wd.id,
                            Window {
                                x: wd.x,
                                y: wd.y,
                                width: wd.width,
                                height: wd.height,
                            },
                        );
                    }
                }
                None => {
                    warn!("window definition at offset {} outside any display set", raw.offset);
                }
            },
            Segment::PaletteDefinition(pds) => match current.as_mut() {
                Some(set) => {
                    set.palettes.insert(pds.id, pds);
                }
                None => {
                    warn!("palette definition at offset {} outside any display set", raw.offset);
                }
            },
            Segment::ObjectDefinition(ods) => match current.as_mut() {
                Some(set) => {
                    set.objects.entry(ods.id).or_default().push(ods);
                }
                None => {
                    warn!("object definition at offset {} outside any display set", raw.offset);
                }
            },
            Segment::End => match current.take() {
                Some(set) if !set.windows.is_empty() => {
                    sets.push(set);
                }
                Some(set) => {
                    warn!(
                        "discarding display set {} with no windows",
                        set.composition.composition_number,
                    );
                }
                None => {
                    warn!("end segment at offset {} outside any display set", raw.offset);
                }
            },
        }
    }

    if let Some(set) = current {
        warn!(
            "stream ended inside display set {}; missing end marker, discarding",
            set.composition.composition_number,
        );
    }

    sets
}
