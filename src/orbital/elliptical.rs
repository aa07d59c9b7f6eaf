use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

use super::root_finding::newton_raphson;
use crate::error::{GncError, Result};

/// Terms of the Bessel series used by [`Elliptical::eccentric_anomaly`].
/// 30 is ample for the eccentricities of Earth orbits; the series slows down
/// as e approaches 1.
pub const BESSEL_SERIES_TERMS: i32 = 30;

/// Iteration budget of the inverse Kepler solve.
pub const KEPLER_MAX_ITERATIONS: usize = 100;

// ---------------------------------------------------------------------------
// Elliptical orbit geometry
// ---------------------------------------------------------------------------

/// A closed two-body orbit described by its apsides.
///
/// A periapsis of 0 encodes a circular orbit of radius `apoapsis`.
/// Formulas follow Curtis, *Orbital Mechanics for Engineering Students*.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elliptical {
    ra: f64, // m
    rp: f64, // m, 0 = circular
}

/// Orientation of the orbital plane in the inertial frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrbitPlane {
    pub inclination: f64,   // rad
    pub raan: f64,          // right ascension of ascending node, rad
    pub arg_periapsis: f64, // rad
}

impl Elliptical {
    pub fn new(apoapsis: f64, periapsis: f64) -> Result<Self> {
        if apoapsis < periapsis || apoapsis < 0.0 {
            return Err(GncError::InvalidOrbitGeometry { apoapsis, periapsis });
        }
        let rp = if apoapsis == periapsis { 0.0 } else { periapsis };
        let orbit = Elliptical { ra: apoapsis, rp };
        let e = orbit.eccentricity();
        if !(0.0..1.0).contains(&e) {
            return Err(GncError::UnsupportedEccentricity(e));
        }
        Ok(orbit)
    }

    pub fn circular(radius: f64) -> Result<Self> {
        Self::new(radius, radius)
    }

    /// Maximum distance from the planet centre, m.
    pub fn apoapsis(&self) -> f64 {
        self.ra
    }

    /// Minimum distance from the planet centre, m.
    pub fn periapsis(&self) -> f64 {
        if self.rp == 0.0 {
            return self.ra;
        }
        self.rp
    }

    pub fn is_circular(&self, tolerance: f64) -> bool {
        self.rp == 0.0 || self.ra - self.rp < tolerance
    }

    pub fn eccentricity(&self) -> f64 {
        self.focal_offset() / self.semi_major_axis()
    }

    /// a = (ra + rp) / 2
    pub fn semi_major_axis(&self) -> f64 {
        0.5 * (self.apoapsis() + self.periapsis())
    }

    /// b = a * sqrt(1 - e^2)
    pub fn semi_minor_axis(&self) -> f64 {
        let e = self.eccentricity();
        self.semi_major_axis() * (1.0 - e * e).sqrt()
    }

    /// Distance between the ellipse centre and the occupied focus.
    pub fn focal_offset(&self) -> f64 {
        self.semi_major_axis() - self.periapsis()
    }

    // -- Geometry at a true anomaly --

    /// Position on the ellipse, centred on the ellipse centre with x towards
    /// periapsis. Eqns (2.77), (2.78).
    pub fn cartesian_coordinates(&self, true_anomaly: f64) -> (f64, f64) {
        let e = self.eccentricity();
        let (sin, cos) = true_anomaly.sin_cos();
        let x = self.semi_major_axis() * (e + cos) / (1.0 + e * cos);
        let y = self.semi_minor_axis() * sin * (1.0 - e * e).sqrt() / (1.0 + e * cos);
        (x, y)
    }

    /// Angle between the velocity and the local horizontal. Eqn (2.52).
    pub fn flight_path_angle(&self, true_anomaly: f64) -> f64 {
        let e = self.eccentricity();
        let (sin, cos) = true_anomaly.sin_cos();
        (e * sin).atan2(1.0 + e * cos)
    }

    // -- Anomalies --

    /// Mean anomaly in [0, 2pi). Eqn (3.3).
    pub fn mean_anomaly(&self, true_anomaly: f64) -> f64 {
        if self.is_circular(0.0) {
            return true_anomaly;
        }
        let e = self.eccentricity();
        let (sin, cos) = true_anomaly.sin_cos();
        let root_sin = (1.0 - e * e).sqrt() * sin;
        (-root_sin).atan2(-e - cos) + PI - e * root_sin / (1.0 + e * cos)
    }

    /// Eccentric anomaly from the Bessel series solution of Kepler's equation,
    /// truncated after [`BESSEL_SERIES_TERMS`] terms.
    pub fn eccentric_anomaly(&self, true_anomaly: f64) -> f64 {
        if self.is_circular(0.0) {
            return true_anomaly;
        }
        let e = self.eccentricity();
        let mean = self.mean_anomaly(true_anomaly);
        let series: f64 = (1..BESSEL_SERIES_TERMS)
            .map(|n| {
                let n_f = f64::from(n);
                libm::jn(n, n_f * e) / n_f * (n_f * mean).sin()
            })
            .sum();
        mean + 2.0 * series
    }

    /// Seconds since the last periapsis passage, in [0, period).
    pub fn elapsed_since_periapsis(&self, mu: f64, true_anomaly: f64) -> f64 {
        self.mean_anomaly(true_anomaly) * self.period(mu) / TAU
    }

    /// Inverse of [`Elliptical::elapsed_since_periapsis`].
    ///
    /// Solves Kepler's equation with Newton's method seeded at M - e/2 and
    /// returns the true anomaly in [0, 2pi). Returns `NaN` when the solve does
    /// not converge to `tolerance` within [`KEPLER_MAX_ITERATIONS`].
    pub fn true_anomaly_from_elapsed(&self, mu: f64, elapsed: f64, tolerance: f64) -> f64 {
        let mean = TAU * elapsed / self.period(mu);
        let e = self.eccentricity();
        let kepler = |ecc_anomaly: f64| {
            let (sin, cos) = ecc_anomaly.sin_cos();
            (ecc_anomaly - e * sin - mean, 1.0 - e * cos)
        };
        let Some(ecc_anomaly) = newton_raphson(kepler, mean - e / 2.0, tolerance, KEPLER_MAX_ITERATIONS)
        else {
            return f64::NAN;
        };
        // Half-angle identity, Eqn (3.10a), written with atan2 to keep the quadrant.
        let (sin_half, cos_half) = (0.5 * ecc_anomaly).sin_cos();
        let nu = 2.0 * ((1.0 + e).sqrt() * sin_half).atan2((1.0 - e).sqrt() * cos_half);
        nu.rem_euclid(TAU)
    }

    // -- Dynamics --

    /// Specific angular momentum, m^2/s. Orbit equation at periapsis.
    pub fn angular_momentum(&self, mu: f64) -> f64 {
        (mu * self.periapsis() * (1.0 + self.eccentricity())).sqrt()
    }

    /// Specific orbital energy, J/kg. Eqn (2.80).
    pub fn specific_energy(&self, mu: f64) -> f64 {
        -mu / (2.0 * self.semi_major_axis())
    }

    /// Orbital period, s.
    pub fn period(&self, mu: f64) -> f64 {
        if self.is_circular(0.0) {
            let (v_r, v_t) = self.velocity(mu, 0.0);
            return TAU * self.ra / v_r.hypot(v_t);
        }
        let a = self.semi_major_axis();
        TAU * (a * a * a / mu).sqrt() // Eqn (2.83)
    }

    /// Orbit equation, Eqn (2.71).
    pub fn distance_to_center(&self, mu: f64, true_anomaly: f64) -> f64 {
        let h = self.angular_momentum(mu);
        h * h / (mu * (1.0 + self.eccentricity() * true_anomaly.cos()))
    }

    /// Radial and tangential velocity components, m/s. Eqns (2.48), (2.49).
    pub fn velocity(&self, mu: f64, true_anomaly: f64) -> (f64, f64) {
        let (sin, cos) = true_anomaly.sin_cos();
        let mu_over_h = mu / self.angular_momentum(mu);
        let e = self.eccentricity();
        (mu_over_h * e * sin, mu_over_h * (1.0 + e * cos))
    }

    // -- State vectors --

    /// Inertial position and velocity at `true_anomaly` for an orbit in `plane`.
    pub fn state_vector(
        &self,
        mu: f64,
        plane: &OrbitPlane,
        true_anomaly: f64,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let r = self.distance_to_center(mu, true_anomaly);
        let (v_r, v_t) = self.velocity(mu, true_anomaly);
        let (sin, cos) = true_anomaly.sin_cos();

        // Perifocal frame (PQW): P towards periapsis, W along angular momentum.
        let r_pqw = Vector3::new(r * cos, r * sin, 0.0);
        let v_pqw = Vector3::new(v_r * cos - v_t * sin, v_r * sin + v_t * cos, 0.0);

        (plane.pqw_to_inertial(&r_pqw), plane.pqw_to_inertial(&v_pqw))
    }

    /// Recover the orbit, its plane and the true anomaly from an inertial state.
    pub fn from_state_vector(
        mu: f64,
        pos: &Vector3<f64>,
        vel: &Vector3<f64>,
    ) -> Result<(Elliptical, OrbitPlane, f64)> {
        let r = pos.norm();
        let v = vel.norm();

        let h = pos.cross(vel);
        let h_mag = h.norm();
        if h_mag < 1e-9 * r * v.max(1.0) {
            return Err(GncError::DegenerateState("zero angular momentum"));
        }

        // Node vector
        let n = Vector3::new(-h.y, h.x, 0.0);
        let n_mag = n.norm();

        // Eccentricity vector
        let e_vec = ((v * v - mu / r) * pos - pos.dot(vel) * vel) / mu;
        let ecc = e_vec.norm();
        if ecc >= 1.0 {
            return Err(GncError::UnsupportedEccentricity(ecc));
        }

        let energy = 0.5 * v * v - mu / r;
        let sma = -mu / (2.0 * energy);

        let inclination = (h.z / h_mag).clamp(-1.0, 1.0).acos();

        let raan = if n_mag > 1e-10 {
            let w = (n.x / n_mag).clamp(-1.0, 1.0).acos();
            if n.y < 0.0 { TAU - w } else { w }
        } else {
            0.0
        };

        // With no node line (equatorial orbit) angles are measured from the inertial x axis.
        let node_dir = if n_mag > 1e-10 { n / n_mag } else { Vector3::x() };
        let arg_periapsis = if ecc <= 1e-10 {
            0.0
        } else if n_mag > 1e-10 {
            let w = (node_dir.dot(&e_vec) / ecc).clamp(-1.0, 1.0).acos();
            if e_vec.z < 0.0 { TAU - w } else { w }
        } else {
            let w = e_vec.y.atan2(e_vec.x);
            (if h.z < 0.0 { -w } else { w }).rem_euclid(TAU)
        };

        let true_anomaly = if ecc > 1e-10 {
            let nu = (e_vec.dot(pos) / (ecc * r)).clamp(-1.0, 1.0).acos();
            if pos.dot(vel) < 0.0 { TAU - nu } else { nu }
        } else {
            // Circular: periapsis is placed on the node line.
            let nu = (node_dir.dot(pos) / r).clamp(-1.0, 1.0).acos();
            if h.dot(&node_dir.cross(pos)) < 0.0 { TAU - nu } else { nu }
        };

        let orbit = Elliptical::new(sma * (1.0 + ecc), sma * (1.0 - ecc))?;
        Ok((
            orbit,
            OrbitPlane {
                inclination,
                raan,
                arg_periapsis,
            },
            true_anomaly,
        ))
    }
}

impl OrbitPlane {
    pub fn equatorial() -> Self {
        OrbitPlane::default()
    }

    /// Rotate a perifocal (PQW) vector into the inertial frame.
    pub fn pqw_to_inertial(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let (sin_raan, cos_raan) = self.raan.sin_cos();
        let (sin_argp, cos_argp) = self.arg_periapsis.sin_cos();
        let (sin_inc, cos_inc) = self.inclination.sin_cos();

        Vector3::new(
            (cos_raan * cos_argp - sin_raan * sin_argp * cos_inc) * v.x
                + (-cos_raan * sin_argp - sin_raan * cos_argp * cos_inc) * v.y,
            (sin_raan * cos_argp + cos_raan * sin_argp * cos_inc) * v.x
                + (-sin_raan * sin_argp + cos_raan * cos_argp * cos_inc) * v.y,
            (sin_argp * sin_inc) * v.x + (cos_argp * sin_inc) * v.y,
        )
    }
}
