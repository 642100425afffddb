/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Models the container metadata an external demuxer reports.
//!
//! The demuxer (`mkvmerge -J` or compatible) runs outside this crate; only its JSON output
//! crosses the boundary. Of everything it reports, this subsystem cares about the track id,
//! the track type, the codec identifier that selects the PGS decoder, and the language tag.


use serde::Deserialize;
use thiserror::Error as ThisError;

/// Codec identifier of PGS subtitle tracks in Matroska containers.
pub const PGS_CODEC_ID: &str = "S_HDMV/PGS";

#[derive(ThisError, Debug)]
pub enum MediaInfoError {
    #[error("could not parse container metadata")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Container metadata as reported by the demuxer. Unknown fields are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub tracks: Vec<TrackInfo>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrackInfo {
    pub id: u64,
    #[serde(rename = "type")]
    pub track_type: String,
    /// Human-readable codec name, e.g. "HDMV PGS".
    #[serde(default)]
    pub codec: String,
    #[serde(default)]
    pub properties: TrackProperties,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrackProperties {
    #[serde(default)]
    pub codec_id: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl MediaInfo {

    pub fn from_json(text: &str) -> Result<Self, MediaInfoError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The subtitle tracks this crate can decode.
    pub fn pgs_tracks(&self) -> impl Iterator<Item = &TrackInfo> {
        self.tracks.iter().filter(|track| {
            track.track_type == "subtitles" && track.properties.codec_id == PGS_CODEC_ID
        })
    }
}

impl TrackInfo {

    /// The track's language tag, or "und" when the container does not carry one.
    pub fn language(&self) -> &str {
        self.properties.language.as_deref().unwrap_or("und")
    }
}
