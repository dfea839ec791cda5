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

//! Tracks one aircraft the way a radar sees it.
//!
//! Live fields follow the network feed. The radar only ever shows the last
//! sampled [`RadarSnapshot`], so the picture lags the feed by up to one sweep.

pub mod snapshot;

use std::collections::VecDeque;
use chrono::{DateTime, Duration, Utc};
use crate::geodesy::{tas_to_ias, EarthCoords, StdPressureAlt};
use crate::settings::Settings;
use crate::xpdr::{SsrMode, TransponderReading};
pub use self::snapshot::RadarSnapshot;

#[derive(Debug, Clone)]
pub struct Aircraft {
    ident: String,
    acft_type: String,
    live_time: DateTime<Utc>,
    live_coords: Option<EarthCoords>,
    live_geom_alt: f64,
    live_xpdr: TransponderReading,
    /// oldest first, never empty
    history: VecDeque<RadarSnapshot>,
    /// kinematics are held while frozen
    pub frozen: bool,
    pub individual_cheat: bool,
    pub ignored: bool,
}

impl Aircraft {
    /// The history is seeded with the first position, as the radar would
    /// see it.
    pub fn new(ident: &str,
               acft_type: &str,
               now: DateTime<Utc>,
               coords: Option<EarthCoords>,
               geom_alt: f64,
               xpdr: TransponderReading,
               settings: &Settings)
               -> Self {
        let mut a = Aircraft {
            ident: ident.to_string(),
            acft_type: acft_type.to_string(),
            live_time: now,
            live_coords: coords,
            live_geom_alt: geom_alt,
            live_xpdr: xpdr,
            history: VecDeque::with_capacity(16),
            frozen: false,
            individual_cheat: false,
            ignored: false,
        };

        let seed = RadarSnapshot::new(now, coords, geom_alt, a.degraded_reading(settings));
        a.history.push_back(seed);

        a
    }

    pub fn update_live_status(&mut self,
                              now: DateTime<Utc>,
                              coords: Option<EarthCoords>,
                              geom_alt: f64,
                              xpdr: TransponderReading) {
        self.live_time = now;
        self.live_coords = coords;
        self.live_geom_alt = geom_alt;
        self.live_xpdr = xpdr;
    }

    fn last_snapshot(&self) -> &RadarSnapshot {
        // seeded in new() and never emptied below one entry
        &self.history[self.history.len() - 1]
    }

    /// Freezes the live state into a new snapshot, unless nothing changed
    /// since the last one.
    pub fn sample_snapshot(&mut self, settings: &Settings) {
        if self.live_time <= self.last_snapshot().time {
            return;
        }

        let mut snap = RadarSnapshot::new(self.live_time,
                                          self.live_coords,
                                          self.live_geom_alt,
                                          self.degraded_reading(settings));

        {
            let prev = self.last_snapshot();

            if self.frozen {
                snap.heading = prev.heading;
                snap.ground_speed = prev.ground_speed;
                snap.vertical_speed = prev.vertical_speed;
            } else if let Some(reference) = self.reference_snapshot(settings.min_lookback_secs) {
                infer_kinematics(&mut snap, reference, prev.heading, settings.taxiing_threshold);
            }
        }

        trace!("{}: sampled {:?}", self.ident, snap);

        self.history.push_back(snap);
        while self.history.len() > settings.snapshot_history_cap.max(1) {
            self.history.pop_front();
        }
    }

    /// Transponder reading as the configured radar gets to see it.
    fn degraded_reading(&self, settings: &Settings) -> TransponderReading {
        if settings.radar_cheat || self.individual_cheat {
            let mut r = self.live_xpdr.clone();

            if r.alt.is_none() {
                r.alt = Some(StdPressureAlt::from_amsl(self.live_geom_alt, settings.qnh_hpa));
            }
            if r.callsign.is_none() {
                r.callsign = Some(self.ident.clone());
            }
            if r.acft_type.is_none() {
                r.acft_type = Some(self.acft_type.clone());
            }

            return r;
        }

        self.live_xpdr.seen_by(settings.ssr_mode)
    }

    /// Most recent snapshot at least `lookback` seconds older than the live
    /// time, or the oldest one.
    fn reference_snapshot(&self, lookback: f64) -> Option<&RadarSnapshot> {
        self.history
            .iter()
            .rev()
            .find(|s| (self.live_time - s.time).num_milliseconds() as f64 / 1000_f64 >= lookback)
            .or_else(|| self.history.front())
    }

    /// Coordinates of the snapshots taken within `lookback` of the live time.
    pub fn position_history(&self, lookback: Duration) -> Vec<EarthCoords> {
        self.history
            .iter()
            .filter(|s| self.live_time - s.time <= lookback)
            .filter_map(|s| s.coords)
            .collect()
    }

    pub fn is_visible(&self, settings: &Settings) -> bool {
        if self.individual_cheat {
            return true;
        }

        let cheat = settings.radar_cheat;
        let detected = cheat || settings.primary_radar_active ||
                       (settings.ssr_mode != SsrMode::Off && !self.xpdr().is_empty());
        let above_floor = match settings.altitude_floor {
            Some(floor) => cheat || self.live_geom_alt >= floor,
            None => true,
        };
        let in_range = self.live_coords
            .map_or(false, |c| settings.in_radar_range(&c));

        detected && above_floor && in_range
    }

    /// Squawked IAS, else estimated from ground speed and altitude.
    pub fn estimated_ias(&self) -> Option<f64> {
        let snap = self.last_snapshot();

        if let Some(ias) = snap.xpdr.ias {
            return Some(ias as f64);
        }

        match (snap.ground_speed, snap.xpdr.alt) {
            (Some(gs), Some(alt)) => Some(tas_to_ias(gs, alt)),
            _ => None,
        }
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn acft_type(&self) -> &str {
        &self.acft_type
    }

    pub fn last_live_update(&self) -> DateTime<Utc> {
        self.live_time
    }

    pub fn live_coords(&self) -> Option<EarthCoords> {
        self.live_coords
    }

    pub fn live_geom_alt(&self) -> f64 {
        self.live_geom_alt
    }

    pub fn history(&self) -> impl Iterator<Item = &RadarSnapshot> {
        self.history.iter()
    }

    pub fn coords(&self) -> Option<EarthCoords> {
        self.last_snapshot().coords
    }

    /// ft
    pub fn geom_alt(&self) -> f64 {
        self.last_snapshot().geom_alt
    }

    pub fn heading(&self) -> Option<f64> {
        self.last_snapshot().heading
    }

    pub fn ground_speed(&self) -> Option<f64> {
        self.last_snapshot().ground_speed
    }

    pub fn vertical_speed(&self) -> Option<f64> {
        self.last_snapshot().vertical_speed
    }

    pub fn xpdr(&self) -> &TransponderReading {
        &self.last_snapshot().xpdr
    }

    pub fn xpdr_code(&self) -> Option<u16> {
        self.xpdr().code
    }

    pub fn xpdr_callsign(&self) -> Option<&str> {
        self.xpdr().callsign.as_ref().map(|s| s.as_str())
    }

    pub fn xpdr_alt(&self) -> Option<StdPressureAlt> {
        self.xpdr().alt
    }

    pub fn is_ground(&self) -> bool {
        self.xpdr().gnd == Some(true)
    }
}

/// Fills heading, ground and vertical speed of `snap` from `reference`.
/// Heading is held at `prev_heading` unless moving faster than `taxiing_kt`.
fn infer_kinematics(snap: &mut RadarSnapshot,
                    reference: &RadarSnapshot,
                    prev_heading: Option<f64>,
                    taxiing_kt: f64) {
    let secs = snap.secs_since(reference);
    // held unless a fresh bearing replaces it, also when coordinates are lost
    snap.heading = prev_heading;

    if secs <= 0_f64 {
        return;
    }

    if let (Some(from), Some(to)) = (reference.coords, snap.coords) {
        let gs = from.distance_to(&to) * 3600_f64 / secs;
        snap.ground_speed = Some(gs);

        if gs > taxiing_kt {
            snap.heading = from.heading_to(&to).or(prev_heading);
        }
    }

    if let (Some(from), Some(to)) = (reference.xpdr.alt, snap.xpdr.alt) {
        snap.vertical_speed = Some((to - from) * 60_f64 / secs);
    }
}
