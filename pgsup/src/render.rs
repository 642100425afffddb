/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Renders display sets into RGBA bitmaps.
//!
//! Object pixel data is run-length encoded with four opcode widths:
//!
//! | bytes                  | meaning                                          |
//! |------------------------|--------------------------------------------------|
//! | `CC`                   | one pixel of color `CC` (`CC` > 0)               |
//! | `00 LL`                | `LL` pixels of color 0 (`LL` ≤ 0x3F)             |
//! | `00 4L LL`             | `LLL` pixels of color 0                          |
//! | `00 8L CC`             | `L` pixels of color `CC`                         |
//! | `00 CL LL CC`          | `LLL` pixels of color `CC`                       |
//!
//! Rendering failures are per-object: a missing palette, window, or size header skips that
//! object and the rest of the composition still draws. A render never fails outright.

#[cfg(test)]
mod tests;

use log::{error, warn};

use crate::displayset::DisplaySet;
use crate::palette::{build_lut, DEFAULT_FILL};

/// An RGBA8 image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Bitmap {

    /// Allocates an image filled with a single color.
    pub fn filled(width: u32, height: u32, fill: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&fill);
        }
        Self { width, height, data }
    }

    /// Returns the pixel at the given coordinates.
    ///
    /// # Panics
    ///
    /// Panics when the coordinates lie outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height);
        let offset = ((y * self.width + x) * 4) as usize;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }

    /// Copies out a sub-rectangle, clamped to the image bounds.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Bitmap {

        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width - x);
        let height = height.min(self.height - y);

        let mut data = Vec::with_capacity((width * height * 4) as usize);

        for row in y..y + height {
            let start = ((row * self.width + x) * 4) as usize;
            data.extend_from_slice(&self.data[start..start + (width * 4) as usize]);
        }

        Bitmap { width, height, data }
    }

    /// Overwrites a rectangle of this image with decoded object pixels, clipping at the
    /// right and bottom edges.
    fn blit(&mut self, x: u32, y: u32, src_width: u32, src_height: u32, pixels: &[u8]) {

        if x >= self.width || y >= self.height {
            return
        }

        let copy_width = (src_width.min(self.width - x) * 4) as usize;

        for row in 0..src_height.min(self.height - y) {
            let src = (row * src_width * 4) as usize;
            let dst = (((y + row) * self.width + x) * 4) as usize;
            self.data[dst..dst + copy_width].copy_from_slice(&pixels[src..src + copy_width]);
        }
    }
}

/// Rendering knobs, passed in explicitly instead of read from any process-wide state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Crop the output to the union bounding box of the drawn objects, plus `margin`.
    pub crop: bool,
    /// Margin in pixels added on every side of the crop box, clamped to the image bounds.
    pub margin: u32,
    /// Background fill color.
    pub fill: [u8; 4],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            crop: true,
            margin: 20,
            fill: DEFAULT_FILL,
        }
    }
}

/// Decodes an RLE buffer into an RGBA pixel run of exactly `pixel_budget` pixels.
///
/// The buffer is padded with three zero bytes so a run truncated mid-opcode reads zeros
/// instead of out of bounds. Declared run lengths are capped at the remaining budget, so a
/// hostile length field cannot balloon the allocation. Output shorter than the budget is
/// padded with color 0.
pub fn decode_rle(data: &[u8], pixel_budget: usize, lut: &[[u8; 4]; 256]) -> Vec<u8> {

    let mut out = Vec::with_capacity(pixel_budget * 4);
    let mut buf = Vec::with_capacity(data.len() + 3);

    buf.extend_from_slice(data);
    buf.extend_from_slice(&[0, 0, 0]);

    let mut pos = 0;

    while pos < data.len() && out.len() < pixel_budget * 4 {

        let b1 = buf[pos];

        if b1 != 0x00 {
            out.extend_from_slice(&lut[usize::from(b1)]);
            pos += 1;
            continue
        }

        let b2 = buf[pos + 1];
        let (run, color, advance) = if b2 <= 0x3F {
            (usize::from(b2), 0, 2)
        } else if b2 <= 0x7F {
            (usize::from(b2 & 0x3F) * 256 + usize::from(buf[pos + 2]), 0, 3)
        } else if b2 <= 0xBF {
            (usize::from(b2 & 0x3F), usize::from(buf[pos + 2]), 3)
        } else {
            (
                usize::from(b2 & 0x3F) * 256 + usize::from(buf[pos + 2]),
                usize::from(buf[pos + 3]),
                4,
            )
        };

        let run = run.min(pixel_budget - out.len() / 4);

        for _ in 0..run {
            out.extend_from_slice(&lut[color]);
        }

        pos += advance;
    }

    while out.len() < pixel_budget * 4 {
        out.extend_from_slice(&lut[0]);
    }

    out
}

/// Renders a display set into a bitmap.
///
/// The image starts out at the composition's declared video size, filled with the
/// background color. Each composition object draws at its composition-declared position.
/// When cropping is enabled and at least one object drew, the output is the union bounding
/// box of the drawn objects plus the margin; a render with zero drawn objects returns the
/// uncropped image.
pub fn render(set: &DisplaySet, options: &RenderOptions) -> Bitmap {

    let composition = &set.composition;
    let video_width = u32::from(composition.width);
    let video_height = u32::from(composition.height);
    let mut image = Bitmap::filled(video_width, video_height, options.fill);

    if video_width == 0 || video_height == 0 {
        warn!(
            "composition {} declares an empty video size",
            composition.composition_number,
        );
        return image
    }

    let lut = match set.palettes.get(&composition.palette_id) {
        Some(palette) => build_lut(palette),
        None => {
            if !composition.composition_objects.is_empty() {
                error!(
                    "unknown palette {} in composition {}",
                    composition.palette_id, composition.composition_number,
                );
            }
            return image
        }
    };

    // Union bounding box of everything drawn, as (x0, y0, x1, y1).
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for object in &composition.composition_objects {

        let fragments = match set.objects.get(&object.object_id) {
            Some(fragments) => fragments,
            None => {
                error!(
                    "unknown object {} in composition {}",
                    object.object_id, composition.composition_number,
                );
                continue
            }
        };

        let mut data = Vec::new();
        let mut header = None;

        for fragment in fragments {
            data.extend_from_slice(&fragment.data);
            if fragment.first_in_sequence {
                header = fragment.header;
            }
        }

        let header = match header {
            Some(header) => header,
            None => {
                error!(
                    "object {} has no size header in composition {}",
                    object.object_id, composition.composition_number,
                );
                continue
            }
        };

        if header.declared_length != data.len() {
            // Render what we have anyway.
            warn!(
                "inconsistent object data length in composition {}: declared {}, have {}",
                composition.composition_number,
                header.declared_length,
                data.len(),
            );
        }

        if !set.windows.contains_key(&object.window_id) {
            error!(
                "unknown window {} in composition {}",
                object.window_id, composition.composition_number,
            );
            continue
        }

        let object_width = u32::from(header.width);
        let object_height = u32::from(header.height);

        if object_width == 0 || object_height == 0 {
            continue
        }

        let pixels = decode_rle(&data, (object_width * object_height) as usize, &lut);
        let x = u32::from(object.x);
        let y = u32::from(object.y);

        image.blit(x, y, object_width, object_height, &pixels);

        bounds = Some(match bounds {
            Some((x0, y0, x1, y1)) => (
                x0.min(x),
                y0.min(y),
                x1.max(x + object_width),
                y1.max(y + object_height),
            ),
            None => (x, y, x + object_width, y + object_height),
        });
    }

    if options.crop {
        if let Some((x0, y0, x1, y1)) = bounds {
            let x = x0.saturating_sub(options.margin);
            let y = y0.saturating_sub(options.margin);
            let width = (x1 + options.margin).min(video_width).saturating_sub(x);
            let height = (y1 + options.margin).min(video_height).saturating_sub(y);
            return image.crop(x, y, width, height)
        }
    }

    image
}
