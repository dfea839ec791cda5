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

use chrono::{DateTime, Utc};
use crate::geodesy::EarthCoords;
use crate::xpdr::TransponderReading;

/// One radar sweep worth of an aircraft. Never modified once in a history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarSnapshot {
    pub time: DateTime<Utc>,
    pub coords: Option<EarthCoords>,
    /// ft
    pub geom_alt: f64,
    pub xpdr: TransponderReading,
    /// true, degrees
    pub heading: Option<f64>,
    /// kt
    pub ground_speed: Option<f64>,
    /// ft/min
    pub vertical_speed: Option<f64>,
}

impl RadarSnapshot {
    pub fn new(time: DateTime<Utc>,
               coords: Option<EarthCoords>,
               geom_alt: f64,
               xpdr: TransponderReading)
               -> Self {
        RadarSnapshot {
            time,
            coords,
            geom_alt,
            xpdr,
            heading: None,
            ground_speed: None,
            vertical_speed: None,
        }
    }

    /// Seconds from `earlier` to this snapshot.
    pub fn secs_since(&self, earlier: &RadarSnapshot) -> f64 {
        (self.time - earlier.time).num_milliseconds() as f64 / 1000_f64
    }
}
