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

//! Outbound FGMS position messages: our own station for the server, radar
//! contacts for the tower viewer.

use super::*;
use chrono::{DateTime, Utc};
use crate::fgms::codec::Codec;
use crate::fgms::message::PositionMessage;
use crate::fgms::properties::PropertyRegistry;
use crate::geodesy::fg_orientation;
use crate::processor::traffic::Contact;
use crate::settings::Settings;
use crate::station::handle::Handle;

const POSITION_FREQ: u16 = 1;
const MPS_PER_KT: f64 = 1852_f64 / 3600_f64;

pub struct FgmsProtocol {
    settings: Settings,
    registry: PropertyRegistry,
    position_counter: u32,
}

fn sim_time(utc: DateTime<Utc>) -> f64 {
    utc.timestamp_millis() as f64 / 1000_f64
}

fn model_path(acft_type: &str) -> String {
    format!("Aircraft/{0}/Models/{0}.xml", acft_type)
}

impl FgmsProtocol {
    pub fn new(settings: Settings) -> Self {
        FgmsProtocol {
            settings,
            registry: PropertyRegistry::fgms(),
            position_counter: 0,
        }
    }

    fn station_report(&self, utc: DateTime<Utc>) -> PositionMessage {
        PositionMessage {
            callsign: self.settings.callsign.clone(),
            model: self.settings.model.clone(),
            time: sim_time(utc),
            lag: 1_f64 / POSITION_FREQ as f64,
            position: self.settings.radar_position.to_ecef(0_f64),
            ..Default::default()
        }
    }

    fn contact_report(&self, c: &Contact, utc: DateTime<Utc>) -> PositionMessage {
        let gs = c.ground_speed.unwrap_or(0_f64) * MPS_PER_KT;
        // body frame, z pointing down
        let down = -ft_to_m!(c.vertical_speed.unwrap_or(0_f64)) / 60_f64;

        let mut m = PositionMessage {
            callsign: c.callsign.clone(),
            model: model_path(&c.acft_type),
            time: sim_time(utc),
            lag: self.settings.sweep_interval_secs,
            position: c.coords.to_ecef(c.geom_alt),
            orientation: fg_orientation(&c.coords, c.heading.unwrap_or(0_f64)),
            linear_vel: [gs as f32, 0_f32, down as f32],
            ..Default::default()
        };
        m.set_transponder_reading(&c.xpdr);

        m
    }

    fn encode(&self, m: &PositionMessage) -> Option<Vec<u8>> {
        let codec = Codec::new(&self.registry);

        match m.encode(&codec, self.settings.legacy_protocol) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("unable to encode position of {}: {}", m.callsign, e);
                None
            }
        }
    }
}

impl Protocol for FgmsProtocol {
    fn run(&mut self, handle: &mut dyn Pushable<Payload>, i: ChainedIter) {
        let utc = handle.get_utc();

        for r in i {
            match *r {
                Report::Traffic(ref c) => {
                    if self.settings.viewer_addr.is_none() {
                        continue;
                    }

                    if let Some(payload) = self.encode(&self.contact_report(c, utc)) {
                        handle.push_data(Payload {
                                             dest: Destination::Viewer,
                                             payload,
                                         });
                    }
                }
                Report::Chat(ref from, ref text) => info!("[{}] {}", from, text),
            }
        }

        run_every!(POSITION_FREQ, self.position_counter, handle, {
            if let Some(payload) = self.encode(&self.station_report(utc)) {
                handle.push_data(Payload {
                                     dest: Destination::Server,
                                     payload,
                                 });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use chrono::TimeZone;
    use crate::geodesy::{EarthCoords, StdPressureAlt};
    use crate::station::handle::{BasicHandle, PushableHandle};
    use crate::xpdr::TransponderReading;

    fn settings() -> Settings {
        Settings {
            callsign: "EGLL_TW".into(),
            radar_position: EarthCoords::new(51.47, -0.46),
            viewer_addr: Some("127.0.0.1:5010".into()),
            ..Default::default()
        }
    }

    fn contact() -> Contact {
        Contact {
            callsign: "DLH4AB".into(),
            acft_type: "A320".into(),
            coords: EarthCoords::new(51.5, -0.4),
            geom_alt: 5000_f64,
            xpdr: TransponderReading {
                code: Some(4721),
                ident: Some(false),
                alt: Some(StdPressureAlt(4900_f64)),
                ..Default::default()
            },
            heading: Some(270_f64),
            ground_speed: Some(250_f64),
            vertical_speed: Some(-700_f64),
            ias: None,
        }
    }

    fn run(p: &mut FgmsProtocol, reports: &[Report]) -> Vec<Payload> {
        let utc = Utc.with_ymd_and_hms(2018, 3, 1, 12, 0, 0).unwrap();
        let mut basic = BasicHandle::at(utc, 10);
        let mut queue = VecDeque::new();
        let none: [Report; 0] = [];

        p.run(&mut PushableHandle::new(&mut basic, &mut queue),
              reports.iter().chain(none.iter()));

        queue.into_iter().collect()
    }

    #[test]
    fn test_station_report() {
        let mut p = FgmsProtocol::new(settings());
        let mut sent = vec![];

        for _ in 0..20 {
            sent.extend(run(&mut p, &[]));
        }

        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|s| s.dest == Destination::Server));

        let r = PropertyRegistry::fgms();
        let m = PositionMessage::decode(&Codec::new(&r), &sent[0].payload, true).unwrap();
        let (coords, alt) = m.coords();

        assert_eq!(m.callsign, "EGLL_TW");
        assert!(!m.legacy);
        assert!(coords.distance_to(&EarthCoords::new(51.47, -0.46)) < 0.001);
        assert!(alt.abs() < 1_f64);
    }

    #[test]
    fn test_relay_to_viewer() {
        let mut p = FgmsProtocol::new(settings());
        let sent = run(&mut p, &[Report::Traffic(contact()), Report::Chat("N1".into(), "hi".into())]);

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].dest, Destination::Viewer);

        let r = PropertyRegistry::fgms();
        let m = PositionMessage::decode(&Codec::new(&r), &sent[0].payload, true).unwrap();
        let xpdr = m.transponder_reading();

        assert_eq!(m.callsign, "DLH4AB");
        assert_eq!(m.aircraft_type(), "A320");
        assert_eq!(xpdr.code, Some(4721));
        assert_eq!(xpdr.alt, Some(StdPressureAlt(4900_f64)));
        assert!((m.linear_vel[0] as f64 - 250_f64 * MPS_PER_KT).abs() < 1e-3);
        assert!(m.linear_vel[2] > 0_f32);
    }

    #[test]
    fn test_no_viewer() {
        let mut s = settings();
        s.viewer_addr = None;
        let mut p = FgmsProtocol::new(s);

        assert!(run(&mut p, &[Report::Traffic(contact())]).is_empty());
    }
}
