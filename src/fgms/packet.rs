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

use super::{FgmsError, Result};

/// Byte FIFO: consumed from the head, grown at the tail.
///
/// Short reads are zero-filled and logged unless the buffer is `strict`,
/// in which case they fail with [`FgmsError::Truncated`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacketData {
    v: Vec<u8>,
    /// start of unconsumed data
    start: usize,
    strict: bool,
}

impl PacketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        PacketData {
            v: bytes.to_vec(),
            start: 0,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn len(&self) -> usize {
        self.v.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.v[self.start..]
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.v.drain(..self.start);
        self.v
    }

    pub fn peek(&self, n: usize) -> Result<Vec<u8>> {
        let available = self.len();

        if available >= n {
            return Ok(self.v[self.start..self.start + n].to_vec());
        }

        if self.strict {
            return Err(FgmsError::Truncated { wanted: n, available });
        }

        warn!("packet too short: wanted {} bytes, {} available, zero-filling", n, available);

        let mut res = self.as_bytes().to_vec();
        res.resize(n, 0);
        Ok(res)
    }

    pub fn pop(&mut self, n: usize) -> Result<Vec<u8>> {
        let res = self.peek(n)?;
        self.start += n.min(self.len());
        Ok(res)
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.v.extend_from_slice(bytes);
    }

    pub fn append_packed(&mut self, other: &PacketData) {
        self.append(other.as_bytes());
    }

    /// Zero-fills until the length is a multiple of `block`.
    pub fn pad(&mut self, block: usize) {
        if block == 0 {
            return;
        }

        while self.len() % block != 0 {
            self.v.push(0);
        }
    }

    fn pop_array<A: Default + AsMut<[u8]>>(&mut self) -> Result<A> {
        let mut a = A::default();
        let n = a.as_mut().len();
        a.as_mut().copy_from_slice(&self.pop(n)?);
        Ok(a)
    }

    pub fn pop_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.pop_array()?))
    }

    pub fn pop_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.pop_array()?))
    }

    pub fn pop_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.pop_array()?))
    }

    pub fn pop_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.pop_array()?))
    }

    /// Reads a `width` byte text field, stopping at the first NUL.
    pub fn pop_text(&mut self, width: usize) -> Result<String> {
        let raw = self.pop(width)?;
        let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());

        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    pub fn append_i32(&mut self, x: i32) {
        self.append(&x.to_be_bytes());
    }

    pub fn append_u32(&mut self, x: u32) {
        self.append(&x.to_be_bytes());
    }

    pub fn append_f32(&mut self, x: f32) {
        self.append(&x.to_be_bytes());
    }

    pub fn append_f64(&mut self, x: f64) {
        self.append(&x.to_be_bytes());
    }

    /// Writes `s` into a `width` byte field, truncated or NUL padded.
    pub fn append_text(&mut self, s: &str, width: usize) {
        let bytes = s.as_bytes();
        let n = bytes.len().min(width);

        self.append(&bytes[..n]);
        self.v.extend(::std::iter::repeat(0).take(width - n));
    }
}
