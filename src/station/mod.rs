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

pub mod handle;

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use std::thread::sleep;
use crate::sensor::{Sensor, SensorData};
use crate::processor::{Processor, Report};
use crate::protocol::{Payload, Protocol};
use crate::transport::Transport;
use self::handle::{PushableHandle, BasicHandle};

/// Main loop: sensors -> processors -> protocols -> transports, once per cycle.
pub struct Station {
    sensors: Vec<Box<dyn Sensor>>,
    processors: Vec<Box<dyn Processor>>,
    protocols: Vec<Box<dyn Protocol>>,
    transports: Vec<Box<dyn Transport>>,
    interval: Duration,
    frequency: u16,
    sensor_queue: VecDeque<SensorData>,
    report_queue: VecDeque<Report>,
    payload_queue: VecDeque<Payload>,
    handle: BasicHandle,
}

impl Station {
    pub fn new(freq: u16) -> Self {
        let freq = freq.max(1);

        Station {
            sensors: vec![],
            processors: vec![],
            protocols: vec![],
            transports: vec![],
            sensor_queue: VecDeque::new(),
            report_queue: VecDeque::new(),
            payload_queue: VecDeque::new(),
            frequency: freq,
            interval: Duration::from_millis((1000 / freq) as u64),
            handle: BasicHandle::new(freq),
        }
    }

    pub fn link_sensor(&mut self, s: Box<dyn Sensor>) {
        self.sensors.push(s);
    }

    pub fn link_processor(&mut self, p: Box<dyn Processor>) {
        self.processors.push(p);
    }

    pub fn link_protocol(&mut self, p: Box<dyn Protocol>) {
        self.protocols.push(p);
    }

    pub fn link_transport(&mut self, t: Box<dyn Transport>) {
        self.transports.push(t);
    }

    fn run_sensors(&mut self) {
        let mut handle = PushableHandle::new(&mut self.handle, &mut self.sensor_queue);

        for s in self.sensors.iter_mut() {
            s.run(&mut handle);
        }
    }

    fn run_processors(&mut self) {
        let mut handle = PushableHandle::new(&mut self.handle, &mut self.report_queue);

        {
            let (first, second) = self.sensor_queue.as_slices();
            debug!("total {} sensor message to process",
                   self.sensor_queue.len());

            for s in self.processors.iter_mut() {
                s.run(&mut handle, first.iter().chain(second));
            }
        }

        self.sensor_queue.clear();
    }

    fn run_protocols(&mut self) {
        let mut handle = PushableHandle::new(&mut self.handle, &mut self.payload_queue);

        {
            let (first, second) = self.report_queue.as_slices();
            debug!("total {} report message to process",
                   self.report_queue.len());
            trace!("{:?}", first);
            trace!("{:?}", second);

            for s in self.protocols.iter_mut() {
                s.run(&mut handle, first.iter().chain(second));
            }
        }

        self.report_queue.clear();
    }

    fn run_transports(&mut self) {
        {
            let (first, second) = self.payload_queue.as_slices();
            debug!("total {} payload message to process",
                   self.payload_queue.len());

            for s in self.transports.iter_mut() {
                s.run(&mut self.handle, first.iter().chain(second));
            }
        }

        self.payload_queue.clear();
    }

    /// One pass through every stage with the given handle.
    fn cycle(&mut self, handle: BasicHandle) {
        self.handle = handle;

        self.run_sensors();
        self.run_processors();
        self.run_protocols();
        self.run_transports();
    }

    pub fn run(&mut self) {
        loop {
            let before = Instant::now();

            self.cycle(BasicHandle::new(self.frequency));

            let elapsed = before.elapsed();

            if elapsed < self.interval {
                sleep(self.interval - elapsed);
            } else {
                warn!("loop unable to keep up with the set frequency");
            }
        }
    }
}

impl Default for Station {
    fn default() -> Station {
        Station::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use crate::fgms::message::PositionMessage;
    use crate::processor::ChainedIter;
    use crate::protocol::Destination;
    use crate::station::handle::{Handle, Pushable};
    use crate::transport::PayloadIter;

    struct OneShot(Option<PositionMessage>);

    impl Sensor for OneShot {
        fn run(&mut self, h: &mut dyn Pushable<SensorData>) {
            if let Some(m) = self.0.take() {
                h.push_data(SensorData::Position(m));
            }
        }
    }

    struct Passthrough;

    impl Processor for Passthrough {
        fn run(&mut self, h: &mut dyn Pushable<Report>, i: ChainedIter) {
            for e in i {
                let SensorData::Position(ref m) = *e;
                h.push_data(Report::Chat(m.callsign.clone(), "hi".to_string()));
            }
        }
    }

    struct Echo;

    impl Protocol for Echo {
        fn run(&mut self, h: &mut dyn Pushable<Payload>, i: crate::protocol::ChainedIter) {
            for r in i {
                if let Report::Chat(ref from, _) = *r {
                    h.push_data(Payload {
                                    dest: Destination::Server,
                                    payload: from.as_bytes().to_vec(),
                                });
                }
            }
        }
    }

    struct Sink(Arc<Mutex<Vec<Vec<u8>>>>);

    impl Transport for Sink {
        fn run(&mut self, _: &mut dyn Handle, i: PayloadIter) {
            let mut sent = self.0.lock().unwrap();
            sent.extend(i.map(|p| p.payload.clone()));
        }
    }

    #[test]
    fn test_cycle() {
        let sent = Arc::new(Mutex::new(vec![]));
        let mut s = Station::new(10);

        s.link_sensor(Box::new(OneShot(Some(PositionMessage {
                                                callsign: "N123".into(),
                                                ..Default::default()
                                            }))));
        s.link_processor(Box::new(Passthrough));
        s.link_protocol(Box::new(Echo));
        s.link_transport(Box::new(Sink(sent.clone())));

        s.cycle(BasicHandle::new(10));
        s.cycle(BasicHandle::new(10));

        assert_eq!(*sent.lock().unwrap(), vec![b"N123".to_vec()]);
        assert!(s.sensor_queue.is_empty());
        assert!(s.report_queue.is_empty());
        assert!(s.payload_queue.is_empty());
    }
}
