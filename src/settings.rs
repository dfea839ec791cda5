// fgradar - FlightGear multiplayer radar feed for ATC training
// Copyright (C) 2017-2018  Datong Sun (dndx@idndx.com)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Radar and network configuration, read-only once the loop runs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use crate::geodesy::EarthCoords;
use crate::xpdr::SsrMode;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] ::std::io::Error),

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// show everything, whatever the equipment
    pub radar_cheat: bool,
    pub primary_radar_active: bool,
    pub ssr_mode: SsrMode,
    /// contacts below this geometric altitude (ft) are hidden
    pub altitude_floor: Option<f64>,
    /// kt
    pub taxiing_threshold: f64,
    pub min_lookback_secs: f64,
    pub snapshot_history_cap: usize,
    pub sweep_interval_secs: f64,
    pub radar_position: EarthCoords,
    pub radar_range_nm: f64,
    pub qnh_hpa: f64,
    /// contacts silent for longer are dropped
    pub contact_timeout_secs: i64,

    /// our own identity on the network
    pub callsign: String,
    pub model: String,
    pub legacy_protocol: bool,
    pub listen_addr: String,
    pub server_addr: String,
    /// tower viewer receiving the relayed traffic, if any
    pub viewer_addr: Option<String>,
    pub strict_decoding: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            radar_cheat: false,
            primary_radar_active: true,
            ssr_mode: SsrMode::C,
            altitude_floor: None,
            taxiing_threshold: 5_f64,
            min_lookback_secs: 6_f64,
            snapshot_history_cap: 120,
            sweep_interval_secs: 5_f64,
            radar_position: EarthCoords::new(0_f64, 0_f64),
            radar_range_nm: 60_f64,
            qnh_hpa: 1013.25,
            contact_timeout_secs: 60,
            callsign: "ATC".to_string(),
            model: "ATC-pie".to_string(),
            legacy_protocol: false,
            listen_addr: "0.0.0.0:5001".to_string(),
            server_addr: "127.0.0.1:5000".to_string(),
            viewer_addr: None,
            strict_decoding: false,
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, SettingsError> {
        let f = File::open(path)?;
        let s = serde_json::from_reader(BufReader::new(f))?;

        Ok(s)
    }

    pub fn from_json(json: &str) -> Result<Settings, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn in_radar_range(&self, coords: &EarthCoords) -> bool {
        self.radar_position.distance_to(coords) <= self.radar_range_nm
    }
}
