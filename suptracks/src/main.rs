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
use pgsup::mediainfo::MediaInfo;

fn main() {

    pretty_env_logger::init();

    let matches = app_from_crate!()
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("JSON-FILE")
            .help("Container metadata as printed by mkvmerge -J; use - for STDIN")
            .required(true)
        )
        .after_help("This utility will list the PGS subtitle tracks a container holds, \
            for feeding track IDs to mkvextract.")
        .get_matches();
    let input_value = matches.value_of("input").unwrap();
    let mut text = String::new();

    if input_value == "-" {
        stdin().read_to_string(&mut text).expect("Could not read STDIN.");
    } else {
        File::open(input_value)
            .expect("Could not open input file for reading.")
            .read_to_string(&mut text)
            .expect("Could not read input file.");
    }

    let info = MediaInfo::from_json(&text).expect("Could not parse container metadata.");
    let mut found = false;

    for track in info.pgs_tracks() {
        println!("track {} [{}] {}", track.id, track.language(), track.codec);
        found = true;
    }

    if !found {
        eprintln!("No PGS subtitle tracks found.");
    }
}
