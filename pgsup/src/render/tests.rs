/*
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use crate::displayset::{DisplaySet, Window};
use crate::segment::{
    CompositionObject,
    CompositionState,
    ObjectDefinitionSegment,
    ObjectHeader,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
};

const WHITE: [u8; 4] = [255, 255, 255, 255];

fn test_lut() -> [[u8; 4]; 256] {
    let mut lut = [DEFAULT_FILL; 256];
    lut[0] = [0, 0, 0, 255];
    lut[5] = [5, 50, 55, 255];
    lut[7] = [7, 70, 77, 255];
    lut
}

fn pixels(color: [u8; 4], count: usize) -> Vec<u8> {
    color.repeat(count)
}

/// A 16x16 composition drawing one 2x2 white object at (2, 3).
fn test_set() -> DisplaySet {

    let composition = PresentationCompositionSegment {
        width: 16,
        height: 16,
        frame_rate: 0x10,
        composition_number: 1,
        composition_state: CompositionState::EpochStart,
        palette_update: false,
        palette_id: 0,
        composition_objects: vec![
            CompositionObject { object_id: 1, window_id: 0, x: 2, y: 3 },
        ],
    };
    let mut set = DisplaySet::new(0, composition);

    set.windows.insert(0, Window { x: 2, y: 3, width: 4, height: 4 });
    set.palettes.insert(
        0,
        PaletteDefinitionSegment {
            id: 0,
            version: 0,
            entries: vec![PaletteEntry { id: 1, y: 235, cr: 128, cb: 128, alpha: 255 }],
        },
    );
    set.objects.insert(
        1,
        vec![
            ObjectDefinitionSegment {
                id: 1,
                version: 0,
                first_in_sequence: true,
                last_in_sequence: true,
                header: Some(ObjectHeader { declared_length: 4, width: 2, height: 2 }),
                data: vec![1, 1, 1, 1],
            },
        ],
    );

    set
}

#[test]
fn test_decode_literal_pixel() {

    let lut = test_lut();

    assert_eq!(decode_rle(&[0x07], 1, &lut), pixels(lut[7], 1));
}

#[test]
fn test_decode_short_zero_run() {

    let lut = test_lut();

    // The trailing 0x05 is never reached: three pixels exhaust the budget first.
    assert_eq!(decode_rle(&[0x00, 0x03, 0x05], 3, &lut), pixels(lut[0], 3));
}

#[test]
fn test_decode_long_zero_run() {

    let lut = test_lut();

    assert_eq!(decode_rle(&[0x00, 0x41, 0x00], 256, &lut), pixels(lut[0], 256));
}

#[test]
fn test_decode_short_color_run() {

    let lut = test_lut();

    assert_eq!(decode_rle(&[0x00, 0x83, 0x07], 3, &lut), pixels(lut[7], 3));
}

#[test]
fn test_decode_long_color_run() {

    let lut = test_lut();

    assert_eq!(decode_rle(&[0x00, 0xC1, 0x02, 0x05], 258, &lut), pixels(lut[5], 258));
}

#[test]
fn test_decode_caps_run_at_budget() {

    let lut = test_lut();

    assert_eq!(decode_rle(&[0x00, 0x4F, 0xFF], 10, &lut), pixels(lut[0], 10));
}

#[test]
fn test_decode_tolerates_truncated_opcode() {

    let lut = test_lut();

    // A lone 0x00 reads its length byte from the zero padding.
    assert_eq!(decode_rle(&[0x00], 4, &lut), pixels(lut[0], 4));
}

#[test]
fn test_decode_pads_short_output() {

    let lut = test_lut();

    let mut expected = pixels(lut[5], 1);
    expected.extend_from_slice(&pixels(lut[0], 2));

    assert_eq!(decode_rle(&[0x05], 3, &lut), expected);
}

#[test]
fn test_render_draws_object() {

    let set = test_set();
    let image = render(&set, &RenderOptions { crop: false, ..RenderOptions::default() });

    assert_eq!(image.width, 16);
    assert_eq!(image.height, 16);
    assert_eq!(image.pixel(2, 3), WHITE);
    assert_eq!(image.pixel(3, 4), WHITE);
    assert_eq!(image.pixel(0, 0), DEFAULT_FILL);
    assert_eq!(image.pixel(4, 5), DEFAULT_FILL);
}

#[test]
fn test_render_crops_to_bounds_plus_margin() {

    let set = test_set();
    let options = RenderOptions { margin: 1, ..RenderOptions::default() };
    let image = render(&set, &options);

    // Object bounds are (2, 3)-(4, 5); one pixel of margin on every side.
    assert_eq!(image.width, 4);
    assert_eq!(image.height, 4);
    assert_eq!(image.pixel(0, 0), DEFAULT_FILL);
    assert_eq!(image.pixel(1, 1), WHITE);
    assert_eq!(image.pixel(2, 2), WHITE);
}

#[test]
fn test_render_margin_clamps_to_video_size() {

    let set = test_set();
    let image = render(&set, &RenderOptions::default());

    assert_eq!(image.width, 16);
    assert_eq!(image.height, 16);
}

#[test]
fn test_render_without_objects_returns_uncropped() {

    let mut set = test_set();
    set.composition.composition_objects.clear();

    let image = render(&set, &RenderOptions::default());

    assert_eq!(image.width, 16);
    assert_eq!(image.height, 16);
    assert!(image.data.chunks_exact(4).all(|pixel| pixel == DEFAULT_FILL));
}

#[test]
fn test_render_missing_palette_yields_fill() {

    let mut set = test_set();
    set.palettes.clear();

    let image = render(&set, &RenderOptions::default());

    assert_eq!(image.width, 16);
    assert!(image.data.chunks_exact(4).all(|pixel| pixel == DEFAULT_FILL));
}

#[test]
fn test_render_missing_window_skips_object() {

    let mut set = test_set();
    set.windows.clear();

    let image = render(&set, &RenderOptions::default());

    assert_eq!(image.width, 16);
    assert!(image.data.chunks_exact(4).all(|pixel| pixel == DEFAULT_FILL));
}

#[test]
fn test_render_survives_declared_length_mismatch() {

    let mut set = test_set();
    if let Some(fragments) = set.objects.get_mut(&1) {
        if let Some(header) = fragments[0].header.as_mut() {
            header.declared_length = 3;
        }
    }

    let image = render(&set, &RenderOptions { crop: false, ..RenderOptions::default() });

    assert_eq!(image.pixel(2, 3), WHITE);
}

#[test]
fn test_render_clips_object_at_video_edge() {

    let mut set = test_set();
    set.composition.composition_objects[0].x = 15;
    set.composition.composition_objects[0].y = 15;

    let image = render(&set, &RenderOptions { crop: false, ..RenderOptions::default() });

    assert_eq!(image.pixel(15, 15), WHITE);
    assert_eq!(image.pixel(14, 14), DEFAULT_FILL);
}

#[test]
fn test_cached_image_is_stable() {

    let set = test_set();
    let options = RenderOptions::default();

    let first = set.image(&options);
    let second = set.image(&options);

    assert!(std::ptr::eq(first, second));
}
