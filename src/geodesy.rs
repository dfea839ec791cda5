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

//! Thin layer over `geo` and `nav_types`.

use std::f64::consts::PI;
use std::ops::Sub;
use geo::{HaversineBearing, HaversineDistance, Point};
use nav_types::{ECEF, WGS84};

const METERS_PER_NM: f64 = 1852_f64;
const STD_QNH: f64 = 1013.25;
// pressure altitude changes by roughly 28 ft per hPa near the ground
const FT_PER_HPA: f64 = 28_f64;
// below this distance two points are considered the same
const COINCIDENT_NM: f64 = 1e-6;

/// Horizontal position in degrees.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct EarthCoords {
    pub lat: f64,
    pub lon: f64,
}

impl EarthCoords {
    pub fn new(lat: f64, lon: f64) -> Self {
        EarthCoords { lat, lon }
    }

    fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Great-circle distance in nautical miles.
    pub fn distance_to(&self, other: &EarthCoords) -> f64 {
        self.point().haversine_distance(&other.point()) / METERS_PER_NM
    }

    /// Initial bearing in degrees [0, 360), `None` for coincident points.
    pub fn heading_to(&self, other: &EarthCoords) -> Option<f64> {
        if self.distance_to(other) < COINCIDENT_NM {
            return None;
        }

        let b = self.point().haversine_bearing(other.point());
        Some((b + 360_f64) % 360_f64)
    }

    /// Converts an earth-centred earth-fixed position (m) into coordinates
    /// and altitude above the ellipsoid (ft).
    pub fn from_ecef(pos: [f64; 3]) -> (EarthCoords, f64) {
        let wgs84: WGS84<f64> = ECEF::new(pos[0], pos[1], pos[2]).into();

        (EarthCoords::new(wgs84.latitude_degrees(), wgs84.longitude_degrees()),
         m_to_ft!(wgs84.altitude()))
    }

    pub fn to_ecef(&self, alt_ft: f64) -> [f64; 3] {
        let ecef: ECEF<f64> = WGS84::from_degrees_and_meters(self.lat, self.lon, ft_to_m!(alt_ft))
            .into();

        [ecef.x(), ecef.y(), ecef.z()]
    }
}

/// Altitude in ft with respect to the standard 1013.25 hPa pressure level.
/// Readings are only meaningful relative to each other.
#[derive(Debug, PartialEq, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct StdPressureAlt(pub f64);

impl StdPressureAlt {
    /// Pressure altitude an altimeter set to standard would read at `amsl_ft`.
    pub fn from_amsl(amsl_ft: f64, qnh_hpa: f64) -> Self {
        StdPressureAlt(amsl_ft + (STD_QNH - qnh_hpa) * FT_PER_HPA)
    }

    pub fn ft(&self) -> f64 {
        self.0
    }

    pub fn flight_level(&self) -> i32 {
        (self.0 / 100_f64).round() as i32
    }
}

impl Sub for StdPressureAlt {
    type Output = f64;

    fn sub(self, rhs: StdPressureAlt) -> f64 {
        self.0 - rhs.0
    }
}

/// IAS estimate from TAS, 2% per 1000 ft, no wind.
pub fn tas_to_ias(tas_kt: f64, alt: StdPressureAlt) -> f64 {
    tas_kt / (1_f64 + 0.02 * alt.ft().max(0_f64) / 1000_f64)
}

/// FlightGear body orientation (angle-axis in the earth-fixed frame) for a
/// level aircraft at `coords` pointing to `heading` degrees.
pub fn fg_orientation(coords: &EarthCoords, heading: f64) -> [f32; 3] {
    // local horizontal frame at lon/lat
    let zd2 = 0.5 * coords.lon.to_radians();
    let yd2 = -0.25 * PI - 0.5 * coords.lat.to_radians();
    let (szd2, czd2) = zd2.sin_cos();
    let (syd2, cyd2) = yd2.sin_cos();
    let hl = [czd2 * cyd2, -szd2 * syd2, czd2 * syd2, szd2 * cyd2];

    // yaw about local down
    let (sh, ch) = (0.5 * heading.to_radians()).sin_cos();
    let hy = [ch, 0_f64, 0_f64, sh];

    let q = [hl[0] * hy[0] - hl[1] * hy[1] - hl[2] * hy[2] - hl[3] * hy[3],
             hl[0] * hy[1] + hl[1] * hy[0] + hl[2] * hy[3] - hl[3] * hy[2],
             hl[0] * hy[2] - hl[1] * hy[3] + hl[2] * hy[0] + hl[3] * hy[1],
             hl[0] * hy[3] + hl[1] * hy[2] - hl[2] * hy[1] + hl[3] * hy[0]];

    let nrm = q.iter().map(|x| x * x).sum::<f64>().sqrt();
    if nrm < 1e-12 {
        return [0_f32; 3];
    }

    let angle = (q[0].abs() / nrm).min(1_f64).acos();
    let s = angle.sin();
    if s.abs() < 1e-12 {
        return [0_f32; 3];
    }

    let k = 2_f64 * angle / (nrm * s) * q[0].signum();

    [(k * q[1]) as f32, (k * q[2]) as f32, (k * q[3]) as f32]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = EarthCoords::new(51_f64, 0_f64);
        let b = EarthCoords::new(52_f64, 0_f64);

        // one degree of latitude is about 60 nm
        assert!((a.distance_to(&b) - 60_f64).abs() < 0.1);
        assert!(a.distance_to(&a) < COINCIDENT_NM);
    }

    #[test]
    fn test_heading() {
        let a = EarthCoords::new(0_f64, 0_f64);

        let east = a.heading_to(&EarthCoords::new(0_f64, 1_f64)).unwrap();
        assert!((east - 90_f64).abs() < 1e-6);

        let west = a.heading_to(&EarthCoords::new(0_f64, -1_f64)).unwrap();
        assert!((west - 270_f64).abs() < 1e-6);

        let north = a.heading_to(&EarthCoords::new(1_f64, 0_f64)).unwrap();
        assert!(north.abs() < 1e-6);

        assert_eq!(a.heading_to(&a), None);
    }

    #[test]
    fn test_ecef() {
        let c = EarthCoords::new(48.35, 11.78);
        let ecef = c.to_ecef(1500_f64);
        let (back, alt) = EarthCoords::from_ecef(ecef);

        assert!((back.lat - c.lat).abs() < 1e-6);
        assert!((back.lon - c.lon).abs() < 1e-6);
        assert!((alt - 1500_f64).abs() < 0.1);
    }

    #[test]
    fn test_pressure_alt() {
        assert_eq!(StdPressureAlt::from_amsl(3000_f64, 1013.25), StdPressureAlt(3000_f64));
        assert_eq!(StdPressureAlt::from_amsl(3000_f64, 1003.25), StdPressureAlt(3280_f64));
        assert_eq!(StdPressureAlt(5200_f64) - StdPressureAlt(5000_f64), 200_f64);
        assert_eq!(StdPressureAlt(35040_f64).flight_level(), 350);
    }

    #[test]
    fn test_tas_to_ias() {
        assert_eq!(tas_to_ias(250_f64, StdPressureAlt(0_f64)), 250_f64);
        assert!((tas_to_ias(240_f64, StdPressureAlt(10000_f64)) - 200_f64).abs() < 1e-9);
    }

    #[test]
    fn test_fg_orientation() {
        let o = fg_orientation(&EarthCoords::new(0_f64, 0_f64), 0_f64);

        assert!(o[0].abs() < 1e-6);
        assert!((o[1] + ::std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!(o[2].abs() < 1e-6);
    }
}
