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

//! Encodes and decodes single properties in either protocol generation.

use std::collections::BTreeMap;
use super::{FgmsError, Result};
use super::message::MAX_PACKET_SIZE;
use super::packet::PacketData;
use super::properties::*;

const SHORT_LIMIT: i32 = 32767;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Str(String),
    /// tight payload that was deliberately left undecoded
    NotDecoded,
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            PropertyValue::Bool(b) => Some(b),
            PropertyValue::Int(i) => Some(i != 0),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match *self {
            PropertyValue::Int(i) => Some(i),
            PropertyValue::Bool(b) => Some(b as i32),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self {
            PropertyValue::Float(f) => Some(f),
            PropertyValue::Int(i) => Some(i as f32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            PropertyValue::Str(ref s) => Some(s),
            _ => None,
        }
    }
}

/// Result of decoding one property from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Single(u32, PropertyValue),
    /// a whole bit-array block, sub-property code -> value
    Multi(BTreeMap<u32, bool>),
}

/// `value * scale` truncated towards zero and clamped to a signed short.
pub fn scaled_short(value: f32, scale: f32) -> i16 {
    let v = (value * scale) as i32;

    v.max(-SHORT_LIMIT).min(SHORT_LIMIT) as i16
}

fn tight_word(code: u32, payload: u16) -> u32 {
    (code << 16) | payload as u32
}

/// Property codec. Stateless apart from the registry it reads from, so any
/// number of threads can share one as long as each call gets its own buffer.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'a> {
    registry: &'a PropertyRegistry,
    decode_floats: bool,
}

impl<'a> Codec<'a> {
    pub fn new(registry: &'a PropertyRegistry) -> Self {
        Codec {
            registry,
            decode_floats: false,
        }
    }

    /// Decode tight short floats instead of returning them as `NotDecoded`.
    pub fn decoding_floats(mut self, decode: bool) -> Self {
        self.decode_floats = decode;
        self
    }

    pub fn registry(&self) -> &'a PropertyRegistry {
        self.registry
    }

    fn lookup(&self, code: u32) -> Result<&'a Property> {
        self.registry
            .get(code)
            .ok_or(FgmsError::UnknownProperty(code))
    }

    /// Appends one property. Nothing is written when an error is returned.
    pub fn pack_property(&self,
                         buf: &mut PacketData,
                         code: u32,
                         value: &PropertyValue,
                         legacy: bool)
                         -> Result<()> {
        let prop = self.lookup(code)?;
        let typ = prop.wire_type(legacy);

        let mismatch = || {
            FgmsError::ValueMismatch {
                code,
                value: value.clone(),
            }
        };

        if typ == WireType::NoSend {
            trace!("property {} is never sent", code);
            return Ok(());
        }

        if !legacy && typ.is_tight() {
            let payload = match typ {
                WireType::TightBool => value.as_bool().ok_or_else(mismatch)? as u16,
                WireType::TightShortInt => {
                    let v = value.as_int().ok_or_else(mismatch)?;
                    if v < 0 || v > 0xFFFF {
                        return Err(FgmsError::Discarded {
                                       code,
                                       reason: format!("{} does not fit in 16 bits", v),
                                   });
                    }
                    v as u16
                }
                WireType::TightShortFloat | WireType::TightShortFloatTenths => {
                    let v = value.as_float().ok_or_else(mismatch)?;
                    // scale() is always set for these two
                    scaled_short(v, typ.scale().unwrap_or(1_f32)) as u16
                }
                WireType::TightString => {
                    let s = value.as_str().ok_or_else(mismatch)?;
                    if s.len() > 0xFFFF {
                        return Err(FgmsError::Discarded {
                                       code,
                                       reason: format!("string of {} bytes", s.len()),
                                   });
                    }

                    buf.append_u32(tight_word(code, s.len() as u16));
                    buf.append(s.as_bytes());
                    pad_block(buf, s.len(), 4);

                    return Ok(());
                }
                _ => unreachable!(),
            };

            buf.append_u32(tight_word(code, payload));
            return Ok(());
        }

        match typ {
            WireType::Bool => {
                let v = value.as_bool().ok_or_else(mismatch)?;
                buf.append_u32(code);
                buf.append_i32(v as i32);
            }
            WireType::Int => {
                let v = value.as_int().ok_or_else(mismatch)?;
                buf.append_u32(code);
                buf.append_i32(v);
            }
            WireType::Float => {
                let v = value.as_float().ok_or_else(mismatch)?;
                buf.append_u32(code);
                buf.append_f32(v);
            }
            WireType::String => {
                let s = value.as_str().ok_or_else(mismatch)?;
                let count = s.chars().count();

                buf.append_u32(code);
                buf.append_i32(count as i32);
                for c in s.chars() {
                    buf.append_i32(c as i32);
                }
                pad_block(buf, count * 4, 16);
            }
            t => {
                error!("property {} has type {:?}, which has no legacy encoding", code, t);
                return Err(FgmsError::IllegalType { code, typ: t });
            }
        }

        Ok(())
    }

    /// Appends a v2 bit-array block. `base` must be the first code of a block;
    /// codes of other blocks found in `values` are ignored.
    pub fn pack_bool_array(&self,
                           buf: &mut PacketData,
                           base: u32,
                           values: &BTreeMap<u32, bool>)
                           -> Result<()> {
        if bool_array_base(base) != Some(base) {
            return Err(FgmsError::IllegalType {
                           code: base,
                           typ: WireType::BoolArray,
                       });
        }

        let bits = values
            .iter()
            .filter(|&(c, v)| *v && bool_array_base(*c) == Some(base))
            .fold(0_u32, |acc, (c, _)| acc | 1 << (c - base));

        buf.append_u32(base);
        buf.append_u32(bits);

        Ok(())
    }

    /// Consumes one property from the head of `buf`.
    pub fn unpack_property(&self, buf: &mut PacketData, is_v2: bool) -> Result<Decoded> {
        let word = buf.pop_u32()?;

        if word >> 16 == 0 {
            let prop = self.lookup(word)?;
            let typ = if is_v2 && prop.v2_type != WireType::SameAsLegacy {
                prop.v2_type.standalone()
            } else {
                prop.legacy_type
            };

            // bits are numbered from the block head
            if typ == WireType::BoolArray && bool_array_base(prop.code) != Some(prop.code) {
                return Err(FgmsError::Protocol(format!("bit-array sent from {}, not a block head",
                                                       prop.code)));
            }

            return self.unpack_value(buf, prop.code, typ);
        }

        let code = word >> 16;
        let payload = (word & 0xFFFF) as u16;
        let prop = self.lookup(code)?;
        let typ = prop.wire_type(false);

        let value = match typ {
            WireType::TightBool => PropertyValue::Bool(payload != 0),
            WireType::TightShortInt => PropertyValue::Int(payload as i16 as i32),
            WireType::TightString => {
                let len = payload as usize;
                let raw = buf.pop(len)?;
                skip_block(buf, len, 4)?;

                PropertyValue::Str(String::from_utf8_lossy(&raw).into_owned())
            }
            WireType::TightShortFloat | WireType::TightShortFloatTenths => {
                if self.decode_floats {
                    let scale = typ.scale().unwrap_or(1_f32);
                    PropertyValue::Float(payload as i16 as f32 / scale)
                } else {
                    PropertyValue::NotDecoded
                }
            }
            t => {
                return Err(FgmsError::Protocol(format!("property {} ({:?}) sent tightly packed",
                                                       code,
                                                       t)))
            }
        };

        Ok(Decoded::Single(code, value))
    }

    fn unpack_value(&self, buf: &mut PacketData, code: u32, typ: WireType) -> Result<Decoded> {
        let value = match typ {
            WireType::Bool => PropertyValue::Bool(buf.pop_i32()? != 0),
            WireType::Int => PropertyValue::Int(buf.pop_i32()?),
            WireType::Float => PropertyValue::Float(buf.pop_f32()?),
            WireType::String => {
                let count = buf.pop_i32()?;
                if count < 0 || count as usize > MAX_PACKET_SIZE {
                    return Err(FgmsError::Protocol(format!("property {} has string length {}",
                                                           code,
                                                           count)));
                }

                let count = count as usize;
                let mut s = String::with_capacity(count);
                for _ in 0..count {
                    let c = buf.pop_u32()?;
                    s.push(::std::char::from_u32(c).unwrap_or('\u{FFFD}'));
                }
                skip_block(buf, count * 4, 16)?;

                PropertyValue::Str(s)
            }
            WireType::BoolArray => {
                let bits = buf.pop_u32()?;
                let map = (0..BOOL_ARRAY_BITS)
                    .map(|bit| (code + bit, bits & (1 << bit) != 0))
                    .filter(|&(c, _)| self.registry.contains(c))
                    .collect();

                return Ok(Decoded::Multi(map));
            }
            t => {
                return Err(FgmsError::Protocol(format!("property {} ({:?}) can not be decoded",
                                                       code,
                                                       t)))
            }
        };

        Ok(Decoded::Single(code, value))
    }
}

fn padding(len: usize, block: usize) -> usize {
    (block - len % block) % block
}

/// Pads a `len` byte field just written to `buf` up to a multiple of `block`.
fn pad_block(buf: &mut PacketData, len: usize, block: usize) {
    buf.append(&vec![0; padding(len, block)]);
}

fn skip_block(buf: &mut PacketData, len: usize, block: usize) -> Result<()> {
    buf.pop(padding(len, block)).map(|_| ())
}
