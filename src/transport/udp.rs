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

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use crate::fgms::message::MAX_PACKET_SIZE;
use crate::fgms::{FgmsError, Result};
use crate::protocol::Destination;
use super::*;

pub struct UDP {
    sock: UdpSocket,
    server: SocketAddr,
    viewer: Option<SocketAddr>,
    /// consecutive sends refused by the server
    refused: u32,
}

fn resolve(addr: &str) -> Result<SocketAddr> {
    addr.to_socket_addrs()?
        .next()
        .ok_or_else(|| FgmsError::Io(format!("{} does not resolve", addr)))
}

impl UDP {
    /// Sends through `sock`, the socket the receiver listens on.
    pub fn new(sock: UdpSocket, server: &str, viewer: Option<&str>) -> Result<Box<dyn Transport>> {
        let server = resolve(server)?;
        let viewer = match viewer {
            Some(v) => Some(resolve(v)?),
            None => None,
        };

        info!("sending to server {}, viewer {:?}", server, viewer);

        Ok(Box::new(UDP {
                        sock,
                        server,
                        viewer,
                        refused: 0,
                    }))
    }

    fn send_to(&mut self, buffer: &[u8], addr: SocketAddr) {
        match self.sock.send_to(buffer, addr) {
            Ok(_) => self.refused = 0,
            Err(e) => {
                match e.kind() {
                    ErrorKind::WouldBlock => warn!("UDP send overwhelming buffers"),
                    ErrorKind::ConnectionRefused => {
                        self.refused += 1;
                        if self.refused == 1 {
                            warn!("{} refused the connection", addr);
                        }
                    }
                    _ => error!("UDP send to {} failed: {}", addr, e),
                }
            }
        }
    }
}

impl Transport for UDP {
    fn run(&mut self, _handle: &mut dyn Handle, i: PayloadIter) {
        for p in i {
            if p.payload.len() > MAX_PACKET_SIZE {
                warn!("dropping {} byte packet, larger than {}", p.payload.len(), MAX_PACKET_SIZE);
                continue;
            }

            let addr = match p.dest {
                Destination::Server => self.server,
                Destination::Viewer => {
                    match self.viewer {
                        Some(v) => v,
                        None => continue,
                    }
                }
            };

            self.send_to(&p.payload, addr);
        }
    }
}
