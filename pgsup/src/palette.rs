/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Materializes palette segments into RGBA lookup tables.
//!
//! Palette entries arrive as YCbCr plus alpha, with Y in the 16–235 range and Cb/Cr in
//! 16–240. Conversion uses the BT.709-style coefficients the format was mastered with.


use crate::segment::PaletteDefinitionSegment;

/// Neutral opaque fill used for undefined palette entries and as the render background.
///
/// Deliberately distinguishable from real transparent content.
pub const DEFAULT_FILL: [u8; 4] = [0x24, 0x24, 0x24, 0xFF];

/// Converts one palette entry to RGBA, clamping each channel to [0, 255] and rounding.
///
/// Alpha passes through untouched.
pub fn ycbcr_to_rgba(y: u8, cr: u8, cb: u8, alpha: u8) -> [u8; 4] {

    let y = f64::from(y) - 16.0;
    let cr = f64::from(cr) - 128.0;
    let cb = f64::from(cb) - 128.0;

    let red = (1.164 * y + 1.793 * cr).max(0.0).min(255.0).round() as u8;
    let green = (1.164 * y - 0.213 * cb - 0.533 * cr).max(0.0).min(255.0).round() as u8;
    let blue = (1.164 * y + 2.112 * cb).max(0.0).min(255.0).round() as u8;

    [red, green, blue, alpha]
}

/// Builds a full 256-entry RGBA table from a palette segment.
///
/// Undefined entries keep [`DEFAULT_FILL`]. Entries with alpha zero are never stored, so a
/// fully transparent color can never surface as a distinct output color.
pub fn build_lut(palette: &PaletteDefinitionSegment) -> [[u8; 4]; 256] {

    let mut lut = [DEFAULT_FILL; 256];

    for entry in &palette.entries {
        if entry.alpha > 0 {
            lut[usize::from(entry.id)] = ycbcr_to_rgba(entry.y, entry.cr, entry.cb, entry.alpha);
        }
    }

    lut
}
