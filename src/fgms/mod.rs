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

//! FlightGear multiplayer (FGMS) wire protocol.
//!
//! Two protocol generations share the network: legacy peers send every
//! property as a code word followed by the value, v2 peers pack most
//! properties into a single word (`code << 16 | payload`).

pub mod codec;
pub mod message;
pub mod packet;
pub mod properties;

use thiserror::Error;

use self::codec::PropertyValue;
use self::properties::WireType;

pub type Result<T> = ::std::result::Result<T, FgmsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FgmsError {
    #[error("truncated packet: wanted {wanted} bytes, {available} available")]
    Truncated { wanted: usize, available: usize },

    #[error("unknown property code {0}")]
    UnknownProperty(u32),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("property {code} cannot be encoded as {typ:?}")]
    IllegalType { code: u32, typ: WireType },

    #[error("property {code} discarded: {reason}")]
    Discarded { code: u32, reason: String },

    #[error("value {value:?} does not fit the type of property {code}")]
    ValueMismatch { code: u32, value: PropertyValue },

    /// socket failures, kept as text so the error stays `Clone`
    #[error("IO error {0}")]
    Io(String),
}

impl From<::std::io::Error> for FgmsError {
    fn from(e: ::std::io::Error) -> Self {
        FgmsError::Io(e.to_string())
    }
}
