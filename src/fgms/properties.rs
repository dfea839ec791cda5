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

use std::collections::HashMap;

pub const PROTOCOL_VERSION_PROP: u32 = 10;
pub const CHAT_PROP: u32 = 10002;

pub const XPDR_CODE_PROP: u32 = 1500;
pub const XPDR_ALT_PROP: u32 = 1501;
pub const XPDR_IDENT_PROP: u32 = 1502;
pub const XPDR_MODE_PROP: u32 = 1503;
pub const XPDR_GND_PROP: u32 = 1504;
pub const XPDR_IAS_PROP: u32 = 1505;

/// Bit-array blocks: codes `base..base + 31` travel as one bitset in v2
pub const BOOL_ARRAY_START: u32 = 11000;
pub const BOOL_ARRAY_BLOCKS: u32 = 3;
pub const BOOL_ARRAY_BLOCK_SIZE: u32 = 40;
pub const BOOL_ARRAY_BITS: u32 = 31;

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum WireType {
    Bool,
    Int,
    Float,
    String,
    /// v2 only: 0/1 in the payload
    TightBool,
    /// v2 only: unsigned 16 bit value in the payload
    TightShortInt,
    /// v2 only: value scaled by 32767
    TightShortFloat,
    /// v2 only: value scaled by 10
    TightShortFloatTenths,
    /// v2 only: byte length in the payload, bytes follow
    TightString,
    BoolArray,
    /// never transmitted
    NoSend,
    /// v2 wire format is identical to legacy
    SameAsLegacy,
}

impl WireType {
    pub fn is_tight(self) -> bool {
        match self {
            WireType::TightBool |
            WireType::TightShortInt |
            WireType::TightShortFloat |
            WireType::TightShortFloatTenths |
            WireType::TightString => true,
            _ => false,
        }
    }

    /// Scale factor of the short float types.
    pub fn scale(self) -> Option<f32> {
        match self {
            WireType::TightShortFloat => Some(32767_f32),
            WireType::TightShortFloatTenths => Some(10_f32),
            _ => None,
        }
    }

    /// Representation used when a tight type shows up behind a plain code word.
    pub fn standalone(self) -> WireType {
        match self {
            WireType::TightBool => WireType::Bool,
            WireType::TightShortInt => WireType::Int,
            WireType::TightShortFloat | WireType::TightShortFloatTenths => WireType::Float,
            WireType::TightString => WireType::String,
            t => t,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Property {
    pub code: u32,
    pub name: String,
    pub legacy_type: WireType,
    pub v2_type: WireType,
}

impl Property {
    pub fn new(code: u32, name: &str, legacy_type: WireType, v2_type: WireType) -> Self {
        Property {
            code,
            name: name.to_string(),
            legacy_type,
            v2_type,
        }
    }

    /// Wire type used when sending with the given protocol generation.
    pub fn wire_type(&self, legacy: bool) -> WireType {
        if legacy || self.v2_type == WireType::SameAsLegacy {
            self.legacy_type
        } else {
            self.v2_type
        }
    }
}

/// Returns the bit-array block a code belongs to, if any.
pub fn bool_array_base(code: u32) -> Option<u32> {
    if code < BOOL_ARRAY_START {
        return None;
    }

    let offset = code - BOOL_ARRAY_START;
    let block = offset / BOOL_ARRAY_BLOCK_SIZE;

    if block < BOOL_ARRAY_BLOCKS && offset % BOOL_ARRAY_BLOCK_SIZE < BOOL_ARRAY_BITS {
        Some(BOOL_ARRAY_START + block * BOOL_ARRAY_BLOCK_SIZE)
    } else {
        None
    }
}

/// Property table. Built once, then shared read-only with every codec.
#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    by_code: HashMap<u32, Property>,
    by_name: HashMap<String, u32>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, p: Property) {
        self.by_name.insert(p.name.clone(), p.code);
        self.by_code.insert(p.code, p);
    }

    pub fn with(mut self, p: Property) -> Self {
        self.insert(p);
        self
    }

    pub fn get(&self, code: u32) -> Option<&Property> {
        self.by_code.get(&code)
    }

    pub fn contains(&self, code: u32) -> bool {
        self.by_code.contains_key(&code)
    }

    pub fn by_name(&self, name: &str) -> Option<&Property> {
        self.by_name.get(name).and_then(|c| self.by_code.get(c))
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.by_code.values()
    }

    /// The property table FlightGear peers use.
    pub fn fgms() -> Self {
        use self::WireType::*;

        let mut r = PropertyRegistry::new();
        let mut add = |code: u32, name: &str, legacy: WireType, v2: WireType| {
            r.insert(Property::new(code, name, legacy, v2))
        };

        add(PROTOCOL_VERSION_PROP, "sim/multiplay/protocol-version", Int, TightShortInt);

        add(100, "surface-positions/left-aileron-pos-norm", Float, TightShortFloat);
        add(101, "surface-positions/right-aileron-pos-norm", Float, TightShortFloat);
        add(102, "surface-positions/elevator-pos-norm", Float, TightShortFloat);
        add(103, "surface-positions/rudder-pos-norm", Float, TightShortFloat);
        add(104, "surface-positions/flap-pos-norm", Float, TightShortFloat);
        add(105, "surface-positions/speedbrake-pos-norm", Float, TightShortFloat);
        add(106, "gear/tailhook/position-norm", Float, TightShortFloat);
        add(107, "gear/launchbar/position-norm", Float, TightShortFloat);
        add(108, "gear/launchbar/state", String, TightString);
        add(109, "gear/launchbar/holdback-position-norm", Float, TightShortFloat);
        add(110, "canopy/position-norm", Float, TightShortFloat);
        add(111, "surface-positions/wing-pos-norm", Float, TightShortFloat);
        add(112, "surface-positions/wing-fold-pos-norm", Float, TightShortFloat);

        for gear in 0..5 {
            let base = 200 + 10 * gear;
            add(base, &format!("gear/gear[{}]/compression-norm", gear), Float, TightShortFloat);
            add(base + 1, &format!("gear/gear[{}]/position-norm", gear), Float, TightShortFloat);
        }

        for engine in 0..4 {
            let base = 300 + 10 * engine;
            add(base, &format!("engines/engine[{}]/n1", engine), Float, TightShortFloatTenths);
            add(base + 1, &format!("engines/engine[{}]/n2", engine), Float, TightShortFloatTenths);
            add(base + 2, &format!("engines/engine[{}]/rpm", engine), Float, TightShortFloatTenths);
        }

        add(400, "rotors/main/rpm", Float, TightShortFloatTenths);
        add(401, "rotors/tail/rpm", Float, TightShortFloatTenths);

        add(1001, "controls/flight/slats", Float, TightShortFloat);
        add(1002, "controls/flight/speedbrake", Float, TightShortFloat);
        add(1003, "controls/flight/spoilers", Float, TightShortFloat);
        add(1004, "controls/gear/gear-down", Float, TightShortFloat);
        add(1005, "controls/lighting/nav-lights", Float, TightShortFloat);
        add(1006, "controls/armament/station[0]/jettison-all", Bool, TightBool);

        add(1100, "sim/model/variant", Int, SameAsLegacy);
        add(1101, "sim/model/livery/file", String, TightString);

        add(1200, "environment/wildfire/data", String, TightString);
        add(1201, "environment/contrail", Int, TightShortInt);
        add(1300, "tanker", Int, TightShortInt);
        add(1400, "scenery/events", String, TightString);

        add(XPDR_CODE_PROP, "instrumentation/transponder/transmitted-id", Int, TightShortInt);
        add(XPDR_ALT_PROP, "instrumentation/transponder/altitude", Int, SameAsLegacy);
        add(XPDR_IDENT_PROP, "instrumentation/transponder/ident", Bool, TightBool);
        add(XPDR_MODE_PROP, "instrumentation/transponder/inputs/mode", Int, TightShortInt);
        add(XPDR_GND_PROP, "instrumentation/transponder/ground-bit", Bool, TightBool);
        add(XPDR_IAS_PROP, "instrumentation/transponder/airspeed-kt", Int, TightShortInt);

        add(10001, "sim/multiplay/transmission-freq-hz", String, NoSend);
        add(CHAT_PROP, "sim/multiplay/chat", String, TightString);

        for i in 0..20 {
            add(10100 + i, &format!("sim/multiplay/generic/string[{}]", i), String, TightString);
            add(10200 + i, &format!("sim/multiplay/generic/float[{}]", i), Float, SameAsLegacy);
            add(10300 + i, &format!("sim/multiplay/generic/int[{}]", i), Int, SameAsLegacy);
        }

        for i in 0..80 {
            add(10500 + i, &format!("sim/multiplay/generic/short[{}]", i), Int, TightShortInt);
        }

        for block in 0..BOOL_ARRAY_BLOCKS {
            for bit in 0..BOOL_ARRAY_BITS {
                let code = BOOL_ARRAY_START + block * BOOL_ARRAY_BLOCK_SIZE + bit;
                let index = block * BOOL_ARRAY_BITS + bit;
                add(code, &format!("sim/multiplay/generic/bool[{}]", index), Bool, BoolArray);
            }
        }

        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_array_base() {
        assert_eq!(bool_array_base(10999), None);
        assert_eq!(bool_array_base(11000), Some(11000));
        assert_eq!(bool_array_base(11030), Some(11000));
        assert_eq!(bool_array_base(11031), None);
        assert_eq!(bool_array_base(11045), Some(11040));
        assert_eq!(bool_array_base(11110), Some(11080));
        assert_eq!(bool_array_base(11120), None);
    }

    #[test]
    fn test_fgms_table() {
        let r = PropertyRegistry::fgms();

        let p = r.get(XPDR_CODE_PROP).unwrap();
        assert_eq!(p.name, "instrumentation/transponder/transmitted-id");
        assert_eq!(p.wire_type(true), WireType::Int);
        assert_eq!(p.wire_type(false), WireType::TightShortInt);

        let alt = r.by_name("instrumentation/transponder/altitude").unwrap();
        assert_eq!(alt.code, XPDR_ALT_PROP);
        assert_eq!(alt.wire_type(false), WireType::Int);

        // 31 bits per 40 code block
        assert_eq!(r.get(11062).unwrap().name, "sim/multiplay/generic/bool[53]");
        assert_eq!(r.get(11080).unwrap().name, "sim/multiplay/generic/bool[62]");
        assert!(!r.contains(42));
    }

    #[test]
    fn test_tight_set() {
        assert!(WireType::TightString.is_tight());
        assert!(!WireType::BoolArray.is_tight());
        assert!(!WireType::SameAsLegacy.is_tight());
        assert_eq!(WireType::TightShortFloatTenths.standalone(), WireType::Float);
        assert_eq!(WireType::TightShortFloat.scale(), Some(32767_f32));
        assert_eq!(WireType::Int.scale(), None);
    }
}
