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

//! Receives position messages relayed by the FGMS server.

use std::io;
use std::net::UdpSocket;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{spawn, JoinHandle};
use crate::fgms::codec::Codec;
use crate::fgms::message::{PositionMessage, MAX_PACKET_SIZE};
use crate::fgms::properties::PropertyRegistry;
use crate::fgms::FgmsError;
use crate::station::handle::Pushable;
use super::{Sensor, SensorData};

pub struct FgmsReceiver {
    _handle: JoinHandle<()>,
    rx: Receiver<PositionMessage>,
}

impl FgmsReceiver {
    /// Starts listening on `sock`, which is shared with the sending side so
    /// that the server relays traffic back to us.
    pub fn new(sock: UdpSocket, strict: bool) -> Self {
        let (tx, rx) = channel();

        // this thread only decodes, whatever it finds is handed to the loop
        let handle = spawn(move || receive_loop(sock, strict, tx));

        info!("FGMS receiver started");

        FgmsReceiver {
            _handle: handle,
            rx,
        }
    }
}

fn receive_loop(sock: UdpSocket, strict: bool, tx: Sender<PositionMessage>) {
    let registry = PropertyRegistry::fgms();
    let codec = Codec::new(&registry);
    let mut buf = vec![0; MAX_PACKET_SIZE];

    loop {
        match sock.recv_from(&mut buf[..]) {
            Ok((n, from)) => {
                trace!("FGMS read {} bytes from {}", n, from);

                match PositionMessage::decode(&codec, &buf[..n], strict) {
                    Ok(msg) => {
                        if tx.send(msg).is_err() {
                            info!("main loop gone, FGMS receiver exiting");
                            return;
                        }
                    }
                    Err(e @ FgmsError::UnknownProperty(_)) => debug!("packet from {} dropped: {}", from, e),
                    Err(e) => warn!("packet from {} dropped: {}", from, e),
                }
            }
            Err(e) => {
                match e.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => trace!("FGMS read timed out"),
                    // the server port answering with ICMP unreachable
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset => {
                        debug!("FGMS server unreachable")
                    }
                    _ => error!("FGMS read error: {}", e),
                }
            }
        }
    }
}

impl Sensor for FgmsReceiver {
    fn run(&mut self, h: &mut dyn Pushable<SensorData>) {
        for m in self.rx.try_iter() {
            h.push_data(SensorData::Position(m));
        }
    }
}
