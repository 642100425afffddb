/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use std::{
    fs::File,
    io::{stdin, Read},
};

use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};
use pgsup::{
    format_timestamp,
    segment::CompositionState,
    timeline::visible_entries,
    RenderOptions,
    SupTrack,
};

fn main() {

    pretty_env_logger::init();

    let matches = app_from_crate!()
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input SUP file; use - for STDIN")
            .required(true)
        )
        .arg(Arg::with_name("entries")
            .long("entries")
            .help("Print the subtitle entry chain instead of display sets")
        )
        .arg(Arg::with_name("frames")
            .long("frames")
            .help("Print paired subtitle frames instead of display sets")
        )
        .after_help("This utility will dump decoded PGS subtitle data.")
        .get_matches();
    let input_value = matches.value_of("input").unwrap();
    let mut data = Vec::new();

    if input_value == "-" {
        stdin().read_to_end(&mut data).expect("Could not read STDIN.");
    } else {
        File::open(input_value)
            .expect("Could not open input file for reading.")
            .read_to_end(&mut data)
            .expect("Could not read input file.");
    }

    let track = SupTrack::from_bytes(&data, RenderOptions::default());

    if matches.is_present("entries") {
        print_entries(&track);
    } else if matches.is_present("frames") {
        print_frames(&track);
    } else {
        print_display_sets(&track);
    }
}

fn print_display_sets(track: &SupTrack) {

    for set in track.display_sets() {
        println!("display_set({})", format_timestamp(set.timestamp_ms()));
        println!("  composition_number = {}", set.composition.composition_number);
        println!("  composition_state = {}", match set.composition.composition_state {
            CompositionState::EpochStart => "EPOCH_START",
            CompositionState::AcquisitionPoint => "ACQUISITION_POINT",
            CompositionState::Normal => "NORMAL_CASE",
        });
        println!("  palette_id = {}", set.composition.palette_id);
        for comp_obj in set.composition.composition_objects.iter() {
            println!("  composition_object");
            println!("    object_id = {}", comp_obj.object_id);
            println!("    window_id = {}", comp_obj.window_id);
            println!("    object_horizontal_position = {}", comp_obj.x);
            println!("    object_vertical_position = {}", comp_obj.y);
        }
        for (id, window) in set.windows.iter() {
            println!("  window");
            println!("    window_id = {}", id);
            println!("    window_horizontal_position = {}", window.x);
            println!("    window_vertical_position = {}", window.y);
            println!("    window_width = {}", window.width);
            println!("    window_height = {}", window.height);
        }
        for (id, palette) in set.palettes.iter() {
            println!("  palette");
            println!("    palette_id = {}", id);
            println!("    palette_entries = [{}]", palette.entries.len());
        }
        for (id, fragments) in set.objects.iter() {
            let data_len: usize = fragments.iter().map(|fragment| fragment.data.len()).sum();
            println!("  object");
            println!("    object_id = {}", id);
            println!("    object_fragments = [{}]", fragments.len());
            println!("    object_data = [{}]", data_len);
        }
        println!();
    }
}

fn print_entries(track: &SupTrack) {

    for entry in visible_entries(track.entries()) {
        println!(
            "{} --> {}  display_set = {}{}",
            format_timestamp(entry.start_ms),
            format_timestamp(entry.end_ms),
            entry.index,
            if entry.epoch_start { "  epoch_start" } else { "" },
        );
    }
}

fn print_frames(track: &SupTrack) {

    for frame in track.frames() {
        let size = track.image(frame.index).map_or_else(
            || "none".to_owned(),
            |image| format!("{}x{}", image.width, image.height),
        );
        println!(
            "frame {}: {} --> {}  image = {}",
            frame.index,
            format_timestamp(frame.start_ms),
            format_timestamp(frame.end_ms),
            size,
        );
    }
}
