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

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

#[macro_use]
mod utils;
mod aircraft;
mod fgms;
mod geodesy;
mod processor;
mod protocol;
mod sensor;
mod settings;
mod station;
mod transport;
mod xpdr;

use std::net::UdpSocket;
use std::process::exit;
use clap::Parser;
use settings::Settings;
use station::Station;

const LOOP_FREQ: u16 = 10; // Hz

/// FlightGear multiplayer radar feed for ATC training
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON settings file
    #[arg(short, long, value_name = "FILE")]
    settings: Option<String>,

    /// Local address to receive FGMS traffic on
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,

    /// FGMS server to report to
    #[arg(long, value_name = "HOST:PORT")]
    server: Option<String>,

    /// Tower viewer to relay radar contacts to
    #[arg(long, value_name = "HOST:PORT")]
    viewer: Option<String>,

    /// Our callsign on the network
    #[arg(short, long)]
    callsign: Option<String>,

    /// Send with the legacy protocol generation
    #[arg(long, default_value_t = false)]
    legacy: bool,
}

impl Args {
    fn apply(self, s: &mut Settings) {
        if let Some(l) = self.listen {
            s.listen_addr = l;
        }
        if let Some(srv) = self.server {
            s.server_addr = srv;
        }
        if self.viewer.is_some() {
            s.viewer_addr = self.viewer;
        }
        if let Some(c) = self.callsign {
            s.callsign = c;
        }
        s.legacy_protocol |= self.legacy;
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    let mut settings = match args.settings {
        Some(ref path) => {
            match Settings::load(path) {
                Ok(s) => s,
                Err(e) => {
                    error!("{}: {}", path, e);
                    exit(1);
                }
            }
        }
        None => Settings::default(),
    };
    args.apply(&mut settings);

    let sock = match UdpSocket::bind(&settings.listen_addr).and_then(|s| {
                                                                         let r = s.try_clone()?;
                                                                         Ok((s, r))
                                                                     }) {
        Ok(s) => s,
        Err(e) => {
            error!("can not bind {}: {}", settings.listen_addr, e);
            exit(1);
        }
    };

    let transport = match transport::udp::UDP::new(sock.0,
                                                   &settings.server_addr,
                                                   settings.viewer_addr.as_ref().map(|v| v.as_str())) {
        Ok(t) => t,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };

    info!("{} on {} reporting to {}",
          settings.callsign,
          settings.listen_addr,
          settings.server_addr);

    let mut s = Station::new(LOOP_FREQ);

    s.link_sensor(Box::new(sensor::fgms::FgmsReceiver::new(sock.1, settings.strict_decoding)));
    s.link_processor(Box::new(processor::traffic::Traffic::new(settings.clone())));
    s.link_protocol(Box::new(protocol::fgms::FgmsProtocol::new(settings)));
    s.link_transport(transport);

    s.run();
}
