use std::f64::consts::{PI, TAU};

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{GncError, Result};
use crate::physics::gravity::{oblate_gravity_g, spherical_gravity_g};
use crate::planet::Planet;

// ---------------------------------------------------------------------------
// Gravity model selector
// ---------------------------------------------------------------------------

/// Which reference surface the coordinates are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GravityModel {
    /// Geocentric: spherical reference surface, inverse-square gravity.
    Spherical,
    /// Geodesic: oblate reference surface, inverse-square gravity plus J2.
    Oblate,
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Longitude, latitude and elevation of a point above a [`Planet`].
///
/// Acts as a single current-position cache: every `set_from_*` call
/// overwrites the previous position. Longitude and latitude are kept in
/// [-pi, pi].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    longitude: f64, // rad, East positive
    latitude: f64,  // rad, North positive
    elevation: f64, // m above the reference sphere
    model: GravityModel,
    planet: Planet,
}

impl Coordinates {
    /// Build coordinates from degrees and an elevation above the reference sphere.
    ///
    /// Use [`Planet::hasl_to_elevation`] to convert a height above sea level.
    pub fn from_degrees(
        planet: Planet,
        model: GravityModel,
        longitude_deg: f64,
        latitude_deg: f64,
        elevation: f64,
    ) -> Result<Self> {
        if elevation < -planet.radius {
            return Err(GncError::ElevationBelowCenter {
                elevation,
                radius: planet.radius,
            });
        }
        Ok(Coordinates {
            longitude: normalize_angle(longitude_deg.to_radians()),
            latitude: normalize_angle(latitude_deg.to_radians()),
            elevation,
            model,
            planet,
        })
    }

    /// Coordinates of an earth-fixed position vector.
    pub fn from_earth_fixed(
        planet: Planet,
        model: GravityModel,
        s_e: &Vector3<f64>,
        epoch: f64,
    ) -> Self {
        let mut coords = Self::unset(planet, model);
        coords.set_from_earth_fixed(s_e, epoch);
        coords
    }

    /// Coordinates of an inertial position vector at `epoch`.
    pub fn from_inertial(planet: Planet, model: GravityModel, s_i: &Vector3<f64>, epoch: f64) -> Self {
        let mut coords = Self::unset(planet, model);
        coords.set_from_inertial(s_i, epoch);
        coords
    }

    fn unset(planet: Planet, model: GravityModel) -> Self {
        Coordinates {
            longitude: 0.0,
            latitude: 0.0,
            elevation: 0.0,
            model,
            planet,
        }
    }

    /// Same position measured against another reference surface.
    pub fn with_model(self, model: GravityModel) -> Self {
        Coordinates { model, ..self }
    }

    // -- Mutation --

    /// Overwrite the position from an earth-fixed position vector.
    ///
    /// The vector already rotates with the planet, so the epoch does not enter
    /// the longitude. `_epoch` is unused and only keeps the signature parallel
    /// to [`Coordinates::set_from_inertial`].
    pub fn set_from_earth_fixed(&mut self, s_e: &Vector3<f64>, _epoch: f64) {
        let dist = s_e.norm();
        self.latitude = (s_e.z / dist).asin();
        self.elevation = dist - self.planet.radius;
        self.longitude = normalize_angle(s_e.y.atan2(s_e.x) + self.planet.celestial_longitude);
    }

    /// Overwrite the position from an inertial position vector at `epoch`.
    ///
    /// Longitude = atan2(y, x) - rotation * epoch + celestial longitude.
    pub fn set_from_inertial(&mut self, s_i: &Vector3<f64>, epoch: f64) {
        let dist = s_i.norm();
        let turned = (self.planet.rotation * epoch).rem_euclid(TAU);
        self.latitude = (s_i.z / dist).asin();
        self.elevation = dist - self.planet.radius;
        self.longitude = normalize_angle(
            normalize_angle(s_i.y.atan2(s_i.x) - turned) + self.planet.celestial_longitude,
        );
    }

    // -- Accessors --

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    pub fn model(&self) -> GravityModel {
        self.model
    }

    pub fn planet(&self) -> &Planet {
        &self.planet
    }

    /// (longitude, latitude) in degrees.
    pub fn degrees(&self) -> (f64, f64) {
        (self.longitude.to_degrees(), self.latitude.to_degrees())
    }

    /// Distance from the planet centre, m.
    pub fn radius(&self) -> f64 {
        self.planet.radius + self.elevation
    }

    /// Earth-fixed azimuth of the point: longitude without the reference
    /// meridian offset.
    fn azimuth(&self) -> f64 {
        self.longitude - self.planet.celestial_longitude
    }

    // -- Gravity and frame tensors --

    /// Gravity acceleration in the local geographic frame (North, East, Down), m/s^2.
    pub fn gravity_g(&self) -> Vector3<f64> {
        let mu = self.planet.gravitational_parameter();
        match self.model {
            GravityModel::Spherical => spherical_gravity_g(mu, self.radius()),
            GravityModel::Oblate => oblate_gravity_g(
                mu,
                self.radius(),
                self.planet.semi_major_axis,
                self.planet.c20,
                self.latitude,
            ),
        }
    }

    /// Geographic/earth-fixed tensor T^GE.
    ///
    /// Rows are the North, East and Down axes in earth-fixed components, so
    /// `tge() * s_e` expresses an earth-fixed vector in the geographic frame.
    pub fn tge(&self) -> Matrix3<f64> {
        let (slo, clo) = self.azimuth().sin_cos();
        let (sla, cla) = self.latitude.sin_cos();
        Matrix3::new(
            -sla * clo, -sla * slo, cla,
            -slo, clo, 0.0,
            -cla * clo, -cla * slo, -sla,
        )
    }

    /// Geographic/inertial tensor T^GI = T^GE * T^EI.
    pub fn tgi(&self, epoch: f64) -> Matrix3<f64> {
        self.tge() * self.planet.tei(epoch)
    }

    /// Planet-centred, planet-fixed position vector, m.
    pub fn earth_fixed_position(&self) -> Vector3<f64> {
        let (slo, clo) = self.azimuth().sin_cos();
        let (sla, cla) = self.latitude.sin_cos();
        self.radius() * Vector3::new(cla * clo, cla * slo, sla)
    }

    /// Inertial position vector at `epoch` together with T^GI.
    pub fn inertial_position(&self, epoch: f64) -> (Vector3<f64>, Matrix3<f64>) {
        let tei = self.planet.tei(epoch);
        let s_i = tei.tr_mul(&self.earth_fixed_position());
        (s_i, self.tge() * tei)
    }
}

// ---------------------------------------------------------------------------
// Angle normalisation
// ---------------------------------------------------------------------------

/// Bring an angle into [-pi, pi] with a single +-2pi correction.
///
/// Inputs must lie within one turn of the range; sine and cosine of the
/// result equal those of the input.
pub fn normalize_angle(rad: f64) -> f64 {
    if rad < -PI {
        rad + TAU
    } else if rad > PI {
        rad - TAU
    } else {
        rad
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
