use std::f64::consts::TAU;

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const BIG_G: f64 = 6.673e-11; // universal gravitational constant, N m^2 / kg^2

// ---------------------------------------------------------------------------
// Planet model
// ---------------------------------------------------------------------------

/// SGP4 constant set of a planet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sgp4Constants {
    pub ke: f64, // sqrt(mu) in planet radii^1.5 / min
    pub j2: f64, // un-normalised zonal harmonics
    pub j3: f64,
    pub j4: f64,
}

/// Immutable planetary constants.
///
/// `Planet` is `Copy`: coordinate systems and integrators hold their own copy,
/// so any number of trajectories can share one model without synchronisation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub mass: f64,                // kg
    pub c20: f64,                 // second zonal harmonic, un-normalised (= -J2)
    pub semi_major_axis: f64,     // m, equatorial radius
    pub rotation: f64,            // rad/s, w.r.t. inertial space
    pub radius: f64,              // m, reference sphere
    pub sea_level_radius: f64,    // m, 0 when the planet has no defined sea level
    pub flattening: f64,          // dimensionless
    pub celestial_longitude: f64, // rad, reference meridian offset
    pub sgp4: Sgp4Constants,
}

impl Planet {
    /// Earth according to WGS84.
    pub fn earth() -> Self {
        Planet {
            mass: 5.973_332e24,
            c20: -1.082_629_989_05e-3,
            semi_major_axis: 6_378_137.0,
            rotation: 7.292_115e-5,
            radius: 6_370_987.0,
            sea_level_radius: 6_371_146.0,
            flattening: 3.335_281_06e-3,
            celestial_longitude: 0.0,
            sgp4: Sgp4Constants {
                ke: 0.074_366_853_168_713_85,
                j2: 1.082_629_989_05e-3,
                j3: -2.532_153_06e-6,
                j4: -1.610_987_61e-6,
            },
        }
    }

    /// A perfectly spherical planet with no sea level and no oblateness.
    pub fn spherical(mass: f64, radius: f64, rotation: f64) -> Self {
        Planet {
            mass,
            c20: 0.0,
            semi_major_axis: radius,
            rotation,
            radius,
            sea_level_radius: 0.0,
            flattening: 0.0,
            celestial_longitude: 0.0,
            sgp4: Sgp4Constants {
                ke: 0.0,
                j2: 0.0,
                j3: 0.0,
                j4: 0.0,
            },
        }
    }

    /// Same planet with a different second zonal harmonic.
    pub fn with_c20(self, c20: f64) -> Self {
        Planet { c20, ..self }
    }

    /// Gravitational parameter mu = G * M, m^3/s^2.
    pub fn gravitational_parameter(&self) -> f64 {
        self.mass * BIG_G
    }

    /// Sidereal day length, s.
    pub fn day(&self) -> f64 {
        debug_assert!(self.rotation != 0.0, "day() of a non-rotating planet");
        TAU / self.rotation
    }

    /// Height of sea level above the reference sphere, m.
    pub fn sea_level_height(&self) -> f64 {
        self.sea_level_radius - self.radius
    }

    /// Convert height above sea level into elevation above the reference sphere.
    pub fn hasl_to_elevation(&self, hasl: f64) -> f64 {
        if self.sea_level_radius == 0.0 {
            return hasl;
        }
        self.sea_level_height() + hasl
    }

    /// Earth-fixed/inertial tensor T^EI at `epoch` seconds.
    ///
    /// Maps inertial components into earth-fixed components: a rotation about
    /// the polar axis by `rotation * epoch`.
    pub fn tei(&self, epoch: f64) -> Matrix3<f64> {
        let (sin, cos) = (self.rotation * epoch).sin_cos();
        Matrix3::new(
            cos, sin, 0.0,
            -sin, cos, 0.0,
            0.0, 0.0, 1.0,
        )
    }

    /// T^IE = transpose of [`Planet::tei`].
    pub fn tie(&self, epoch: f64) -> Matrix3<f64> {
        self.tei(epoch).transpose()
    }
}

impl Default for Planet {
    fn default() -> Self {
        Self::earth()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::Vector3;

    #[test]
    fn earth_gravitational_parameter() {
        let mu = Planet::earth().gravitational_parameter();
        assert_relative_eq!(mu, 3.986_004_443_6e14, max_relative = 1e-9);
    }

    #[test]
    fn sidereal_day() {
        let day = Planet::earth().day();
        // 23 h 56 min 4 s
        assert!((day - 86_164.1).abs() < 0.5, "got {day}");
    }

    #[test]
    fn hasl_offsets_by_sea_level() {
        let earth = Planet::earth();
        assert_abs_diff_eq!(earth.hasl_to_elevation(25.0), 25.0 + 159.0, epsilon = 1e-9);

        let ball = Planet::spherical(1e20, 1e5, 1e-4);
        assert_eq!(ball.hasl_to_elevation(25.0), 25.0);
    }

    #[test]
    fn tei_rotates_about_pole() {
        let earth = Planet::earth();
        let quarter = earth.day() / 4.0;
        let x_e = earth.tei(quarter) * Vector3::x();
        // After a quarter turn the inertial x axis sits at -90 deg earth-fixed longitude.
        assert_abs_diff_eq!(x_e, -Vector3::y(), epsilon = 1e-12);

        let s = Vector3::new(1.0, 2.0, 3.0);
        let back = earth.tie(1234.5) * (earth.tei(1234.5) * s);
        assert_abs_diff_eq!(back, s, epsilon = 1e-12);
        assert_eq!(earth.tei(0.0), Matrix3::identity());
    }

    #[test]
    fn deserializes_from_json() {
        let json = serde_json::to_string(&Planet::earth()).unwrap();
        let planet: Planet = serde_json::from_str(&json).unwrap();
        assert_eq!(planet, Planet::earth());
    }
}
