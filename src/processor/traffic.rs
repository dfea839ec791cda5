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

//! Maintains the traffic situation around the radar.

use super::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use chrono::Duration;
use crate::aircraft::Aircraft;
use crate::fgms::properties::CHAT_PROP;
use crate::geodesy::EarthCoords;
use crate::settings::Settings;
use crate::station::handle::Handle;
use crate::xpdr::TransponderReading;

const CLEANUP_FREQ: f32 = 0.1;
// sweeps faster than this make no sense at the loop frequencies we run
const MIN_SWEEP_SECS: f64 = 0.1;
// a day of silence, anything longer would overflow chrono
const MAX_CONTACT_TIMEOUT_SECS: i64 = 86400;

/// What the radar shows of one aircraft after a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub callsign: String,
    pub acft_type: String,
    pub coords: EarthCoords,
    /// ft
    pub geom_alt: f64,
    pub xpdr: TransponderReading,
    pub heading: Option<f64>,
    pub ground_speed: Option<f64>,
    pub vertical_speed: Option<f64>,
    pub ias: Option<f64>,
}

impl Contact {
    /// `None` until the aircraft has been seen somewhere.
    pub fn from_aircraft(a: &Aircraft) -> Option<Contact> {
        Some(Contact {
                 callsign: a.ident().to_string(),
                 acft_type: a.acft_type().to_string(),
                 coords: a.coords()?,
                 geom_alt: a.geom_alt(),
                 xpdr: a.xpdr().clone(),
                 heading: a.heading(),
                 ground_speed: a.ground_speed(),
                 vertical_speed: a.vertical_speed(),
                 ias: a.estimated_ias(),
             })
    }
}

pub struct Traffic {
    settings: Settings,
    situation: HashMap<String, Aircraft>,
    /// last chat line heard from each callsign
    chat: HashMap<String, String>,
    sweep_counter: u32,
    cleanup_counter: u32,
}

impl Traffic {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            situation: HashMap::with_capacity(100),
            chat: HashMap::new(),
            sweep_counter: 0,
            cleanup_counter: 0,
        }
    }

    pub fn get(&self, callsign: &str) -> Option<&Aircraft> {
        self.situation.get(callsign)
    }

    pub fn get_mut(&mut self, callsign: &str) -> Option<&mut Aircraft> {
        self.situation.get_mut(callsign)
    }

    fn sweep(&mut self, handle: &mut dyn Pushable<Report>) {
        debug!("radar sweep over {} aircraft", self.situation.len());

        for a in self.situation.values_mut() {
            a.sample_snapshot(&self.settings);

            if a.ignored || !a.is_visible(&self.settings) {
                continue;
            }

            if let Some(c) = Contact::from_aircraft(a) {
                trace!("Contact: {:?}", c);
                handle.push_data(Report::Traffic(c));
            }
        }
    }
}

impl Processor for Traffic {
    fn run(&mut self, handle: &mut dyn Pushable<Report>, i: ChainedIter) {
        let utc = handle.get_utc();

        for e in i {
            let SensorData::Position(ref m) = *e;

            // our own reports, echoed by some servers
            if m.callsign == self.settings.callsign {
                continue;
            }

            let (coords, alt) = m.coords();
            let reading = m.transponder_reading();

            match self.situation.entry(m.callsign.clone()) {
                Entry::Occupied(mut o) => {
                    o.get_mut()
                        .update_live_status(utc, Some(coords), alt, reading)
                }
                Entry::Vacant(v) => {
                    info!("new contact {} ({})", m.callsign, m.aircraft_type());
                    v.insert(Aircraft::new(&m.callsign,
                                           &m.aircraft_type(),
                                           utc,
                                           Some(coords),
                                           alt,
                                           reading,
                                           &self.settings));
                }
            }

            if let Some(text) = m.properties.get(&CHAT_PROP).and_then(|v| v.as_str()) {
                if !text.is_empty() && self.chat.get(&m.callsign).map_or(true, |t| t != text) {
                    self.chat.insert(m.callsign.clone(), text.to_string());
                    handle.push_data(Report::Chat(m.callsign.clone(), text.to_string()));
                }
            }
        }

        let sweep_hz = 1_f64 / self.settings.sweep_interval_secs.max(MIN_SWEEP_SECS);

        run_every!(sweep_hz, self.sweep_counter, handle, {
            self.sweep(handle);
        });

        run_every!(CLEANUP_FREQ, self.cleanup_counter, handle, {
            debug!("clean up traffic map");

            let timeout = Duration::seconds(self.settings
                                                .contact_timeout_secs
                                                .clamp(0, MAX_CONTACT_TIMEOUT_SECS));
            self.situation.retain(|k, a| {
                let keep = utc - a.last_live_update() < timeout;
                if !keep {
                    info!("contact {} lost", k);
                }
                keep
            });

            let situation = &self.situation;
            self.chat.retain(|k, _| situation.contains_key(k));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use chrono::{DateTime, TimeZone, Utc};
    use crate::fgms::codec::PropertyValue;
    use crate::fgms::message::PositionMessage;
    use crate::fgms::properties::{XPDR_CODE_PROP, XPDR_MODE_PROP};
    use crate::station::handle::{BasicHandle, PushableHandle};
    use crate::xpdr::SsrMode;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 3, 1, 12, 0, 0).unwrap()
    }

    fn settings() -> Settings {
        Settings {
            callsign: "EGLL_TW".into(),
            radar_position: EarthCoords::new(51.47, -0.46),
            sweep_interval_secs: 1_f64,
            ..Default::default()
        }
    }

    fn position(callsign: &str, lat: f64) -> SensorData {
        let mut m = PositionMessage {
            callsign: callsign.into(),
            model: "Aircraft/c172p/Models/c172p.xml".into(),
            position: EarthCoords::new(lat, -0.46).to_ecef(2000_f64),
            ..Default::default()
        };
        m.properties.insert(XPDR_MODE_PROP, PropertyValue::Int(5));
        m.properties.insert(XPDR_CODE_PROP, PropertyValue::Int(7000));

        SensorData::Position(m)
    }

    /// Runs one loop cycle at `secs` after t0 and returns the reports.
    fn cycle(t: &mut Traffic, secs: f64, input: &[SensorData]) -> Vec<Report> {
        let utc = t0() + Duration::milliseconds((secs * 1000_f64) as i64);
        let mut basic = BasicHandle::at(utc, 10);
        let mut queue = VecDeque::new();
        let none: [SensorData; 0] = [];

        t.run(&mut PushableHandle::new(&mut basic, &mut queue),
              input.iter().chain(none.iter()));

        queue.into_iter().collect()
    }

    #[test]
    fn test_sweep_reports_contacts() {
        let mut t = Traffic::new(settings());
        let mut reports = vec![];

        for i in 0..10 {
            let input = [position("N123", 51.47 + 0.001 * i as f64), position("EGLL_TW", 51.47)];
            reports.extend(cycle(&mut t, i as f64 / 10_f64, &input));
        }

        // one sweep per second at 10 Hz
        assert_eq!(reports.len(), 1);
        match reports[0] {
            Report::Traffic(ref c) => {
                assert_eq!(c.callsign, "N123");
                assert_eq!(c.acft_type, "c172p");
                assert_eq!(c.xpdr.code, Some(7000));
                assert!(c.ground_speed.is_some());
            }
            ref r => panic!("unexpected {:?}", r),
        }

        assert!(t.get("EGLL_TW").is_none());
        assert_eq!(t.get("N123").unwrap().history().count(), 2);
    }

    #[test]
    fn test_new_contact_degraded_on_first_sweep() {
        let mut s = settings();
        s.ssr_mode = SsrMode::Off;
        let mut t = Traffic::new(s);

        for i in 0..9 {
            assert!(cycle(&mut t, i as f64 / 10_f64, &[]).is_empty());
        }

        // arrives in the sweep cycle itself
        let reports = cycle(&mut t, 0.9, &[position("N123", 51.47)]);
        assert_eq!(reports.len(), 1);
        match reports[0] {
            Report::Traffic(ref c) => {
                assert_eq!(c.callsign, "N123");
                assert!(c.xpdr.is_empty());
            }
            ref r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn test_ignored_contact_not_reported() {
        let mut t = Traffic::new(settings());
        cycle(&mut t, 0_f64, &[position("N123", 51.47)]);
        t.get_mut("N123").unwrap().ignored = true;

        let mut reports = vec![];
        for i in 1..10 {
            reports.extend(cycle(&mut t, i as f64 / 10_f64, &[]));
        }

        assert!(reports.is_empty());
        // still tracked
        assert_eq!(t.get("N123").unwrap().history().count(), 1);
    }

    #[test]
    fn test_chat() {
        let mut t = Traffic::new(settings());
        let mut input = position("N123", 51.47);
        if let SensorData::Position(ref mut m) = input {
            m.properties.insert(CHAT_PROP, PropertyValue::Str("hello tower".into()));
        }

        let first = cycle(&mut t, 0_f64, &[input]);
        assert_eq!(first.len(), 1);
        match first[0] {
            Report::Chat(ref from, ref text) => {
                assert_eq!(from, "N123");
                assert_eq!(text, "hello tower");
            }
            ref r => panic!("unexpected {:?}", r),
        }

        let mut again = position("N123", 51.47);
        if let SensorData::Position(ref mut m) = again {
            m.properties.insert(CHAT_PROP, PropertyValue::Str("hello tower".into()));
        }
        assert!(cycle(&mut t, 0.1, &[again]).is_empty());
    }

    #[test]
    fn test_cleanup() {
        let mut t = Traffic::new(settings());
        cycle(&mut t, 0_f64, &[position("N123", 51.47)]);

        for i in 1..100 {
            cycle(&mut t, 30_f64 + i as f64, &[position("N456", 51.47)]);
        }

        // cleanup ran once, at 129 s
        assert!(t.get("N123").is_none());
        assert!(t.get("N456").is_some());
    }

    #[test]
    fn test_huge_contact_timeout() {
        let mut s = settings();
        s.contact_timeout_secs = i64::MAX;
        let mut t = Traffic::new(s);
        cycle(&mut t, 0_f64, &[position("N123", 51.47)]);

        for i in 1..100 {
            cycle(&mut t, 30_f64 + i as f64, &[]);
        }

        assert!(t.get("N123").is_some());
    }
}
