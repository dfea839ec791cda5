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

use chrono::{DateTime, Utc};
use std::time::Instant;
use std::collections::VecDeque;

/// What every stage gets to know about the current loop cycle.
pub trait Handle {
    fn get_utc(&self) -> DateTime<Utc>;
    fn get_clock(&self) -> Instant;
    fn get_frequency(&self) -> u16;
}

pub trait Pushable<D>: Handle {
    fn push_data(&mut self, d: D);
}

pub struct BasicHandle {
    utc: DateTime<Utc>,
    clock: Instant,
    freq: u16,
}

impl Handle for BasicHandle {
    fn get_utc(&self) -> DateTime<Utc> {
        self.utc
    }

    fn get_clock(&self) -> Instant {
        self.clock
    }

    fn get_frequency(&self) -> u16 {
        self.freq
    }
}

impl BasicHandle {
    pub fn new(freq: u16) -> Self {
        Self::at(Utc::now(), freq)
    }

    /// Handle for a cycle happening at `utc`.
    pub fn at(utc: DateTime<Utc>, freq: u16) -> Self {
        Self {
            utc,
            clock: Instant::now(),
            freq,
        }
    }
}

pub struct PushableHandle<'a, H, D>
    where D: 'a,
          H: 'a + Handle
{
    handle: &'a mut H,
    queue: &'a mut VecDeque<D>,
}

impl<'a, H, D> Handle for PushableHandle<'a, H, D>
    where H: 'a + Handle
{
    fn get_utc(&self) -> DateTime<Utc> {
        self.handle.get_utc()
    }

    fn get_clock(&self) -> Instant {
        self.handle.get_clock()
    }

    fn get_frequency(&self) -> u16 {
        self.handle.get_frequency()
    }
}

impl<'a, H, D> Pushable<D> for PushableHandle<'a, H, D>
    where H: 'a + Handle
{
    fn push_data(&mut self, d: D) {
        self.queue.push_back(d);
    }
}

impl<'a, H, D> PushableHandle<'a, H, D>
    where H: 'a + Handle
{
    pub fn new(handle: &'a mut H, queue: &'a mut VecDeque<D>) -> Self {
        Self { handle, queue }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pushable_handle() {
        let utc = Utc.with_ymd_and_hms(2018, 3, 1, 12, 0, 0).unwrap();
        let mut basic = BasicHandle::at(utc, 10);
        let mut queue = VecDeque::new();

        {
            let mut h = PushableHandle::new(&mut basic, &mut queue);
            h.push_data(1);
            h.push_data(2);

            assert_eq!(h.get_utc(), utc);
            assert_eq!(h.get_frequency(), 10);
        }

        assert_eq!(queue, VecDeque::from(vec![1, 2]));
    }
}
