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

//! Whole FGMS packets: header, position body and property list.

use std::collections::BTreeMap;
use std::path::Path;
use nom::bytes::complete::take;
use nom::number::complete::be_u32;
use nom::sequence::tuple;
use nom::IResult;
use super::{FgmsError, Result};
use super::codec::{Codec, Decoded, PropertyValue};
use super::packet::PacketData;
use super::properties::*;
use crate::geodesy::{EarthCoords, StdPressureAlt};
use crate::xpdr::TransponderReading;

pub const MAGIC: u32 = 0x4647_4653; // "FGFS"
pub const PROTOCOL_VERSION: u32 = 0x0001_0001;
pub const CHAT_MSG_ID: u32 = 1;
pub const POS_DATA_ID: u32 = 7;
pub const HEADER_LEN: usize = 32;
pub const POSITION_BODY_LEN: usize = 200;
pub const MAX_PACKET_SIZE: usize = 1200;
pub const CALLSIGN_LEN: usize = 8;
pub const MODEL_LEN: usize = 96;
pub const V2_PROTOCOL: i32 = 2;
// transponder values meaning "not available"
const XPDR_INVALID: i32 = -9999;

pub type PropertyMap = BTreeMap<u32, PropertyValue>;

#[derive(Debug, PartialEq, Clone)]
pub struct Header {
    pub msg_id: u32,
    /// whole packet, header included
    pub length: u32,
    pub requested_range: u32,
    pub reply_port: u32,
    pub callsign: String,
}

/// Transponder modes of the FlightGear instrument.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum XpdrMode {
    Off,
    Standby,
    Test,
    Ground,
    On,
    Altitude,
}

impl XpdrMode {
    pub fn from_fg(mode: i32) -> Option<XpdrMode> {
        match mode {
            0 => Some(XpdrMode::Off),
            1 => Some(XpdrMode::Standby),
            2 => Some(XpdrMode::Test),
            3 => Some(XpdrMode::Ground),
            4 => Some(XpdrMode::On),
            5 => Some(XpdrMode::Altitude),
            _ => None,
        }
    }

    pub fn to_fg(self) -> i32 {
        match self {
            XpdrMode::Off => 0,
            XpdrMode::Standby => 1,
            XpdrMode::Test => 2,
            XpdrMode::Ground => 3,
            XpdrMode::On => 4,
            XpdrMode::Altitude => 5,
        }
    }
}

/// A position report, as sent by every FGMS peer several times per second.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct PositionMessage {
    pub callsign: String,
    pub model: String,
    pub time: f64,
    pub lag: f64,
    /// earth-centred earth-fixed, metres
    pub position: [f64; 3],
    pub orientation: [f32; 3],
    pub linear_vel: [f32; 3],
    pub angular_vel: [f32; 3],
    pub linear_accel: [f32; 3],
    pub angular_accel: [f32; 3],
    pub properties: PropertyMap,
    /// sent with the legacy protocol generation
    pub legacy: bool,
}

/// Raw header fields: magic, version and the rest.
fn parse_header(input: &[u8]) -> IResult<&[u8], (u32, u32, Header)> {
    let (rem, (magic, version, msg_id, length, requested_range, reply_port, callsign)) =
        tuple((be_u32, be_u32, be_u32, be_u32, be_u32, be_u32, take(CALLSIGN_LEN)))(input)?;

    Ok((rem,
        (magic,
         version,
         Header {
             msg_id,
             length,
             requested_range,
             reply_port,
             callsign: text_field(callsign),
         })))
}

fn check_header(magic: u32, version: u32) -> Result<()> {
    if magic != MAGIC {
        return Err(FgmsError::Protocol(format!("bad magic {:#010x}", magic)));
    }

    if version != PROTOCOL_VERSION {
        return Err(FgmsError::Protocol(format!("unsupported protocol version {:#010x}",
                                               version)));
    }

    Ok(())
}

fn text_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());

    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn read_vec3(buf: &mut PacketData) -> Result<[f32; 3]> {
    Ok([buf.pop_f32()?, buf.pop_f32()?, buf.pop_f32()?])
}

fn write_vec3(buf: &mut PacketData, v: &[f32; 3]) {
    for x in v {
        buf.append_f32(*x);
    }
}

impl PositionMessage {
    /// Decodes a complete packet. Any error means the whole packet is dropped.
    pub fn decode(codec: &Codec, bytes: &[u8], strict: bool) -> Result<PositionMessage> {
        let (_, (magic, version, header)) =
            parse_header(bytes).map_err(|_| {
                                            FgmsError::Truncated {
                                                wanted: HEADER_LEN,
                                                available: bytes.len(),
                                            }
                                        })?;
        check_header(magic, version)?;

        if header.msg_id != POS_DATA_ID {
            return Err(FgmsError::Protocol(format!("message id {} is not a position",
                                                   header.msg_id)));
        }

        let length = header.length as usize;
        if length < HEADER_LEN + POSITION_BODY_LEN {
            return Err(FgmsError::Protocol(format!("position message of {} bytes", length)));
        }

        if length > bytes.len() {
            if strict {
                return Err(FgmsError::Truncated {
                               wanted: length,
                               available: bytes.len(),
                           });
            }

            warn!("{}: header announces {} bytes, got {}",
                  header.callsign,
                  length,
                  bytes.len());
        }

        let end = length.min(bytes.len());
        let mut buf = PacketData::from_bytes(&bytes[HEADER_LEN..end]).strict(strict);

        let mut msg = PositionMessage {
            callsign: header.callsign,
            model: buf.pop_text(MODEL_LEN)?,
            time: buf.pop_f64()?,
            lag: buf.pop_f64()?,
            position: [buf.pop_f64()?, buf.pop_f64()?, buf.pop_f64()?],
            orientation: read_vec3(&mut buf)?,
            linear_vel: read_vec3(&mut buf)?,
            angular_vel: read_vec3(&mut buf)?,
            linear_accel: read_vec3(&mut buf)?,
            angular_accel: read_vec3(&mut buf)?,
            properties: PropertyMap::new(),
            legacy: true,
        };
        buf.pop_u32()?; // padding

        while !buf.is_empty() {
            match codec.unpack_property(&mut buf, !msg.legacy)? {
                Decoded::Single(code, value) => {
                    if code == PROTOCOL_VERSION_PROP {
                        msg.legacy = value.as_int().map_or(true, |v| v < V2_PROTOCOL);
                    }

                    msg.properties.insert(code, value);
                }
                Decoded::Multi(m) => {
                    for (code, b) in m {
                        msg.properties.insert(code, PropertyValue::Bool(b));
                    }
                }
            }
        }

        trace!("{} ({}): {} properties", msg.callsign, msg.model, msg.properties.len());

        Ok(msg)
    }

    /// Encodes this message with the given protocol generation. Properties
    /// that can not be represented are logged and left out.
    pub fn encode(&self, codec: &Codec, legacy: bool) -> Result<Vec<u8>> {
        let mut body = PacketData::new();

        body.append_text(&self.model, MODEL_LEN);
        body.append_f64(self.time);
        body.append_f64(self.lag);
        for x in &self.position {
            body.append_f64(*x);
        }
        write_vec3(&mut body, &self.orientation);
        write_vec3(&mut body, &self.linear_vel);
        write_vec3(&mut body, &self.angular_vel);
        write_vec3(&mut body, &self.linear_accel);
        write_vec3(&mut body, &self.angular_accel);
        body.append_u32(0);

        if !legacy {
            codec.pack_property(&mut body,
                                PROTOCOL_VERSION_PROP,
                                &PropertyValue::Int(V2_PROTOCOL),
                                false)?;
        }

        let mut bool_blocks = BTreeMap::new();

        for (code, value) in &self.properties {
            if *code == PROTOCOL_VERSION_PROP {
                continue;
            }

            if !legacy {
                if let Some(base) = bool_array_base(*code) {
                    let block = bool_blocks.entry(base).or_insert_with(BTreeMap::new);
                    block.insert(*code, value.as_bool().unwrap_or(false));
                    continue;
                }
            }

            match codec.pack_property(&mut body, *code, value, legacy) {
                Err(e @ FgmsError::Discarded { .. }) |
                Err(e @ FgmsError::ValueMismatch { .. }) => {
                    warn!("{}: {}", self.callsign, e);
                }
                r => r?,
            }
        }

        for (base, values) in &bool_blocks {
            codec.pack_bool_array(&mut body, *base, values)?;
        }

        let mut packet = PacketData::new();
        packet.append_u32(MAGIC);
        packet.append_u32(PROTOCOL_VERSION);
        packet.append_u32(POS_DATA_ID);
        packet.append_u32((HEADER_LEN + body.len()) as u32);
        packet.append_u32(0); // requested range
        packet.append_u32(0); // reply port
        packet.append_text(&self.callsign, CALLSIGN_LEN);
        packet.append_packed(&body);

        Ok(packet.into_bytes())
    }

    /// Position and altitude (ft above the ellipsoid).
    pub fn coords(&self) -> (EarthCoords, f64) {
        EarthCoords::from_ecef(self.position)
    }

    /// Aircraft type from the model path, e.g. `Aircraft/c172p/Models/c172p.xml`.
    pub fn aircraft_type(&self) -> String {
        Path::new(&self.model)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model.clone())
    }

    fn int_prop(&self, code: u32) -> Option<i32> {
        self.properties
            .get(&code)
            .and_then(|v| v.as_int())
            .filter(|v| *v != XPDR_INVALID)
    }

    fn bool_prop(&self, code: u32) -> Option<bool> {
        self.properties.get(&code).and_then(|v| v.as_bool())
    }

    /// What the transponder of this aircraft squawks. Peers that do not
    /// send a mode are taken as squawking everything they send.
    pub fn transponder_reading(&self) -> TransponderReading {
        let mode = match self.int_prop(XPDR_MODE_PROP) {
            Some(m) => XpdrMode::from_fg(m),
            None => Some(XpdrMode::Altitude),
        };

        let code = self.int_prop(XPDR_CODE_PROP)
            .filter(|c| is_squawk_code(*c))
            .map(|c| c as u16);

        let mut r = match mode {
            Some(XpdrMode::Ground) | Some(XpdrMode::On) | Some(XpdrMode::Altitude)
                if code.is_some() => {
                TransponderReading {
                    code,
                    ident: Some(self.bool_prop(XPDR_IDENT_PROP).unwrap_or(false)),
                    callsign: Some(self.callsign.clone()),
                    acft_type: Some(self.aircraft_type()),
                    gnd: self.bool_prop(XPDR_GND_PROP),
                    ias: self.int_prop(XPDR_IAS_PROP)
                        .filter(|v| *v >= 0)
                        .map(|v| v as u16),
                    ..Default::default()
                }
            }
            _ => return TransponderReading::default(),
        };

        match mode {
            Some(XpdrMode::Ground) => r.gnd = Some(true),
            Some(XpdrMode::Altitude) => {
                r.alt = self.int_prop(XPDR_ALT_PROP)
                    .map(|a| StdPressureAlt(a as f64))
            }
            _ => {}
        }

        r
    }

    /// Sets the transponder properties to squawk `r`.
    pub fn set_transponder_reading(&mut self, r: &TransponderReading) {
        let mode = if r.code.is_none() {
            XpdrMode::Standby
        } else if r.gnd == Some(true) {
            XpdrMode::Ground
        } else if r.alt.is_some() {
            XpdrMode::Altitude
        } else {
            XpdrMode::On
        };

        let p = &mut self.properties;
        p.insert(XPDR_MODE_PROP, PropertyValue::Int(mode.to_fg()));
        // no "invalid" marker for the code, it has no room in a tight short
        match r.code {
            Some(c) => p.insert(XPDR_CODE_PROP, PropertyValue::Int(c as i32)),
            None => p.remove(&XPDR_CODE_PROP),
        };
        p.insert(XPDR_ALT_PROP,
                 PropertyValue::Int(r.alt.map_or(XPDR_INVALID, |a| a.ft().round() as i32)));
        p.insert(XPDR_IDENT_PROP, PropertyValue::Bool(r.ident.unwrap_or(false)));
        if let Some(gnd) = r.gnd {
            p.insert(XPDR_GND_PROP, PropertyValue::Bool(gnd));
        }

        if let Some(ias) = r.ias {
            p.insert(XPDR_IAS_PROP, PropertyValue::Int(ias as i32));
        }
    }
}

/// Four octal digits, written in decimal.
fn is_squawk_code(c: i32) -> bool {
    (0..=7777).contains(&c) && [1, 10, 100, 1000].iter().all(|d| c / d % 10 <= 7)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PositionMessage {
        let mut msg = PositionMessage {
            callsign: "DLH4AB".into(),
            model: "Aircraft/A320/Models/A320neo-CFM.xml".into(),
            time: 1234.5,
            lag: 0.1,
            position: EarthCoords::new(48.35, 11.78).to_ecef(5000_f64),
            orientation: [0.1, -0.2, 0.3],
            linear_vel: [120_f32, 0_f32, -2_f32],
            ..Default::default()
        };

        msg.properties.insert(XPDR_CODE_PROP, PropertyValue::Int(4721));
        msg.properties.insert(XPDR_ALT_PROP, PropertyValue::Int(4850));
        msg.properties.insert(XPDR_IDENT_PROP, PropertyValue::Bool(false));
        msg.properties.insert(XPDR_MODE_PROP, PropertyValue::Int(5));
        msg.properties.insert(CHAT_PROP, PropertyValue::Str("hello".into()));
        msg.properties.insert(11001, PropertyValue::Bool(true));
        msg
    }

    #[test]
    fn test_parse_header() {
        let mut p = PacketData::new();
        p.append_u32(MAGIC);
        p.append_u32(PROTOCOL_VERSION);
        p.append_u32(POS_DATA_ID);
        p.append_u32(232);
        p.append_u32(100);
        p.append_u32(0);
        p.append_text("EDDM_TW", CALLSIGN_LEN);
        p.append(&[1, 2]);

        let bytes = p.into_bytes();
        let (rem, (magic, version, h)) = parse_header(&bytes).unwrap();

        assert_eq!(rem, &[1, 2]);
        assert!(check_header(magic, version).is_ok());
        assert_eq!(h,
                   Header {
                       msg_id: POS_DATA_ID,
                       length: 232,
                       requested_range: 100,
                       reply_port: 0,
                       callsign: "EDDM_TW".into(),
                   });
    }

    #[test]
    fn test_round_trip_v2() {
        let r = PropertyRegistry::fgms();
        let codec = Codec::new(&r);
        let msg = sample();

        let bytes = msg.encode(&codec, false).unwrap();
        assert_eq!(&bytes[..4], b"FGFS");
        assert_eq!(bytes.len() % 4, 0);

        let back = PositionMessage::decode(&codec, &bytes, true).unwrap();
        assert!(!back.legacy);
        assert_eq!(back.callsign, msg.callsign);
        assert_eq!(back.position, msg.position);
        assert_eq!(back.orientation, msg.orientation);
        assert_eq!(back.properties[&PROTOCOL_VERSION_PROP], PropertyValue::Int(2));
        assert_eq!(back.properties[&CHAT_PROP], PropertyValue::Str("hello".into()));
        assert_eq!(back.properties[&11001], PropertyValue::Bool(true));
        assert_eq!(back.properties[&11000], PropertyValue::Bool(false));
        assert_eq!(back.properties[&XPDR_CODE_PROP], PropertyValue::Int(4721));
    }

    #[test]
    fn test_round_trip_legacy() {
        let r = PropertyRegistry::fgms();
        let codec = Codec::new(&r);
        let msg = sample();

        let bytes = msg.encode(&codec, true).unwrap();
        let back = PositionMessage::decode(&codec, &bytes, true).unwrap();

        assert!(back.legacy);
        assert_eq!(back, PositionMessage { legacy: true, ..msg });
    }

    #[test]
    fn test_discarded_property_is_left_out() {
        let r = PropertyRegistry::fgms();
        let codec = Codec::new(&r);
        let mut msg = sample();
        msg.properties.insert(XPDR_IAS_PROP, PropertyValue::Int(-5));

        let bytes = msg.encode(&codec, false).unwrap();
        let back = PositionMessage::decode(&codec, &bytes, true).unwrap();

        assert!(!back.properties.contains_key(&XPDR_IAS_PROP));
        assert_eq!(back.properties[&CHAT_PROP], PropertyValue::Str("hello".into()));
    }

    #[test]
    fn test_bad_packets() {
        let r = PropertyRegistry::fgms();
        let codec = Codec::new(&r);
        let mut bytes = sample().encode(&codec, false).unwrap();

        match PositionMessage::decode(&codec, &bytes[..20], false) {
            Err(FgmsError::Truncated { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }

        match PositionMessage::decode(&codec, &bytes[..bytes.len() - 4], true) {
            Err(FgmsError::Truncated { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }

        bytes[0] = b'X';
        match PositionMessage::decode(&codec, &bytes, false) {
            Err(FgmsError::Protocol(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_property_drops_packet() {
        let r = PropertyRegistry::fgms();
        let codec = Codec::new(&r);
        let mut bytes = sample().encode(&codec, true).unwrap();

        bytes.extend_from_slice(&[0, 0, 0, 42, 0, 0, 0, 1]);
        let len = bytes.len() as u32;
        bytes[12..16].copy_from_slice(&len.to_be_bytes());

        assert_eq!(PositionMessage::decode(&codec, &bytes, false),
                   Err(FgmsError::UnknownProperty(42)));
    }

    #[test]
    fn test_transponder_reading() {
        let mut msg = sample();

        let r = msg.transponder_reading();
        assert_eq!(r.code, Some(4721));
        assert_eq!(r.alt, Some(StdPressureAlt(4850_f64)));
        assert_eq!(r.callsign, Some("DLH4AB".to_string()));
        assert_eq!(r.acft_type, Some("A320neo-CFM".to_string()));
        assert_eq!(r.ident, Some(false));

        msg.properties.insert(XPDR_MODE_PROP, PropertyValue::Int(4));
        assert_eq!(msg.transponder_reading().alt, None);

        msg.properties.insert(XPDR_MODE_PROP, PropertyValue::Int(3));
        let r = msg.transponder_reading();
        assert_eq!(r.gnd, Some(true));
        assert_eq!(r.alt, None);

        msg.properties.insert(XPDR_MODE_PROP, PropertyValue::Int(1));
        assert!(msg.transponder_reading().is_empty());

        msg.properties.insert(XPDR_MODE_PROP, PropertyValue::Int(5));
        msg.properties.insert(XPDR_CODE_PROP, PropertyValue::Int(-9999));
        assert!(msg.transponder_reading().is_empty());

        // not octal
        msg.properties.insert(XPDR_CODE_PROP, PropertyValue::Int(1289));
        assert!(msg.transponder_reading().is_empty());

        msg.properties.insert(XPDR_CODE_PROP, PropertyValue::Int(7777));
        assert_eq!(msg.transponder_reading().code, Some(7777));
        msg.properties.insert(XPDR_CODE_PROP, PropertyValue::Int(0));
        assert_eq!(msg.transponder_reading().code, Some(0));
    }

    #[test]
    fn test_set_transponder_reading() {
        let mut msg = sample();
        let r = msg.transponder_reading();

        let mut other = PositionMessage::default();
        other.callsign = msg.callsign.clone();
        other.model = msg.model.clone();
        other.set_transponder_reading(&r);

        assert_eq!(other.transponder_reading(), r);

        msg.properties.clear();
        msg.set_transponder_reading(&TransponderReading::default());
        assert!(msg.transponder_reading().is_empty());
    }
}
