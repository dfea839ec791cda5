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

//! What an aircraft's transponder squawks.

use crate::geodesy::StdPressureAlt;

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize)]
pub enum XpdrKey {
    Code,
    Ident,
    Alt,
    Callsign,
    AcftType,
    Gnd,
    Ias,
}

pub const ALL_KEYS: [XpdrKey; 7] = [XpdrKey::Code,
                                    XpdrKey::Ident,
                                    XpdrKey::Alt,
                                    XpdrKey::Callsign,
                                    XpdrKey::AcftType,
                                    XpdrKey::Gnd,
                                    XpdrKey::Ias];

/// Secondary surveillance radar capability.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum SsrMode {
    /// no SSR at all
    Off,
    /// identity only
    A,
    /// identity and altitude
    C,
    /// everything
    S,
}

/// One transponder readout. A `None` field is not squawked.
#[derive(Debug, Default, PartialEq, Clone, Serialize)]
pub struct TransponderReading {
    pub code: Option<u16>,
    pub ident: Option<bool>,
    pub alt: Option<StdPressureAlt>,
    pub callsign: Option<String>,
    pub acft_type: Option<String>,
    pub gnd: Option<bool>,
    pub ias: Option<u16>,
}

impl TransponderReading {
    pub fn is_empty(&self) -> bool {
        ALL_KEYS.iter().all(|k| !self.contains(*k))
    }

    pub fn contains(&self, key: XpdrKey) -> bool {
        match key {
            XpdrKey::Code => self.code.is_some(),
            XpdrKey::Ident => self.ident.is_some(),
            XpdrKey::Alt => self.alt.is_some(),
            XpdrKey::Callsign => self.callsign.is_some(),
            XpdrKey::AcftType => self.acft_type.is_some(),
            XpdrKey::Gnd => self.gnd.is_some(),
            XpdrKey::Ias => self.ias.is_some(),
        }
    }

    /// Keys currently squawked, in declaration order.
    pub fn keys(&self) -> Vec<XpdrKey> {
        ALL_KEYS
            .iter()
            .cloned()
            .filter(|k| self.contains(*k))
            .collect()
    }

    pub fn without(mut self, keys: &[XpdrKey]) -> Self {
        for k in keys {
            match *k {
                XpdrKey::Code => self.code = None,
                XpdrKey::Ident => self.ident = None,
                XpdrKey::Alt => self.alt = None,
                XpdrKey::Callsign => self.callsign = None,
                XpdrKey::AcftType => self.acft_type = None,
                XpdrKey::Gnd => self.gnd = None,
                XpdrKey::Ias => self.ias = None,
            }
        }

        self
    }

    /// What a radar with SSR capability `mode` gets to see of this reading.
    pub fn seen_by(&self, mode: SsrMode) -> TransponderReading {
        let r = self.clone();

        match mode {
            SsrMode::Off => TransponderReading::default(),
            SsrMode::A => {
                r.without(&[XpdrKey::Alt,
                            XpdrKey::Callsign,
                            XpdrKey::AcftType,
                            XpdrKey::Ias,
                            XpdrKey::Gnd])
            }
            SsrMode::C => r.without(&[XpdrKey::Callsign, XpdrKey::AcftType, XpdrKey::Ias, XpdrKey::Gnd]),
            SsrMode::S => r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> TransponderReading {
        TransponderReading {
            code: Some(4721),
            ident: Some(false),
            alt: Some(StdPressureAlt(12000_f64)),
            callsign: Some("DLH4AB".into()),
            acft_type: Some("A320".into()),
            gnd: Some(false),
            ias: Some(250),
        }
    }

    #[test]
    fn test_keys() {
        assert!(TransponderReading::default().is_empty());
        assert_eq!(full().keys(), ALL_KEYS.to_vec());

        let r = full().without(&[XpdrKey::Ident, XpdrKey::Ias]);
        assert!(!r.contains(XpdrKey::Ias));
        assert_eq!(r.keys().len(), 5);
    }

    #[test]
    fn test_seen_by() {
        assert!(full().seen_by(SsrMode::Off).is_empty());
        assert_eq!(full().seen_by(SsrMode::A).keys(), vec![XpdrKey::Code, XpdrKey::Ident]);
        assert_eq!(full().seen_by(SsrMode::C).keys(),
                   vec![XpdrKey::Code, XpdrKey::Ident, XpdrKey::Alt]);
        assert_eq!(full().seen_by(SsrMode::S), full());
    }
}
