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

use crate::station::handle::Handle;
use crate::protocol::Payload;
use std::iter::Chain;
use std::slice::Iter;

pub type PayloadIter<'a> = Chain<Iter<'a, Payload>, Iter<'a, Payload>>;

pub mod udp;

/// A `Transport` takes the payloads generated by the protocol layer
/// and puts them on the wire
pub trait Transport {
    fn run(&mut self, handle: &mut dyn Handle, i: PayloadIter);
}
