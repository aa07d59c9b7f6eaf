use nalgebra::Vector3;

use super::integrator::{SecondOrderSolver, StormerExtrapolation};
use crate::coordinates::Coordinates;
use crate::error::{GncError, Result};

// ---------------------------------------------------------------------------
// Integrator state
// ---------------------------------------------------------------------------

/// Epoch and inertial state of the integrated point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorState {
    pub time: f64,              // s
    pub position: Vector3<f64>, // m, inertial
    pub velocity: Vector3<f64>, // m/s, inertial
}

impl IntegratorState {
    /// Distance from the planet centre, m.
    pub fn radius(&self) -> f64 {
        self.position.norm()
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Two-body specific mechanical energy, J/kg.
    pub fn specific_energy(&self, mu: f64) -> f64 {
        0.5 * self.velocity.norm_squared() - mu / self.radius()
    }
}

// ---------------------------------------------------------------------------
// Point-mass integrator
// ---------------------------------------------------------------------------

/// Integrates a point in inertial coordinates under the gravity of the
/// coordinate system's planet plus an external acceleration.
///
/// The integrator owns its [`Coordinates`]: every acceleration evaluation
/// overwrites them with the position being evaluated, and after each step
/// they describe the returned state.
#[derive(Debug, Clone)]
pub struct PointMassIntegrator<S: SecondOrderSolver = StormerExtrapolation> {
    coords: Coordinates,
    state: IntegratorState,
    solver: S,
}

impl PointMassIntegrator<StormerExtrapolation> {
    pub fn new(coords: Coordinates, t0: f64, s_i0: Vector3<f64>, v_i0: Vector3<f64>) -> Self {
        Self::with_solver(StormerExtrapolation::default(), coords, t0, s_i0, v_i0)
    }
}

impl<S: SecondOrderSolver> PointMassIntegrator<S> {
    pub fn with_solver(
        solver: S,
        coords: Coordinates,
        t0: f64,
        s_i0: Vector3<f64>,
        v_i0: Vector3<f64>,
    ) -> Self {
        Self {
            coords,
            state: IntegratorState {
                time: t0,
                position: s_i0,
                velocity: v_i0,
            },
            solver,
        }
    }

    /// Advance the state by `dt` seconds.
    ///
    /// `a_g` is an external acceleration in the local geographic frame
    /// (North, East, Down), held constant for the whole step. A `dt` that is
    /// not positive and finite is rejected and the state is left untouched.
    pub fn step(&mut self, dt: f64, a_g: &Vector3<f64>) -> Result<IntegratorState> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(GncError::InvalidTimeStep(dt));
        }
        let a_ext = *a_g;
        let coords = &mut self.coords;
        let mut accel = |t: f64, s_i: &Vector3<f64>| {
            let tei = coords.planet().tei(t);
            coords.set_from_earth_fixed(&(tei * s_i), t);
            let tgi = coords.tge() * tei;
            tgi.tr_mul(&(a_ext + coords.gravity_g()))
        };

        let t0 = self.state.time;
        self.solver.advance(
            t0,
            &mut self.state.position,
            &mut self.state.velocity,
            dt,
            &mut accel,
        );
        self.state.time = t0 + dt;
        self.coords.set_from_inertial(&self.state.position, self.state.time);
        Ok(self.state)
    }

    pub fn state(&self) -> IntegratorState {
        self.state
    }

    /// Coordinates of the current state.
    pub fn coordinates(&self) -> &Coordinates {
        &self.coords
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn into_coordinates(self) -> Coordinates {
        self.coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::GravityModel;
    use crate::orbital::{Elliptical, OrbitPlane};
    use crate::planet::Planet;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn leo(model: GravityModel) -> (PointMassIntegrator, f64, f64) {
        let planet = Planet::earth();
        let mu = planet.gravitational_parameter();
        let orbit = Elliptical::circular(planet.radius + 500e3).unwrap();
        let plane = OrbitPlane {
            inclination: 0.9,
            ..OrbitPlane::default()
        };
        let (pos, vel) = orbit.state_vector(mu, &plane, 0.0);
        let coords = Coordinates::from_inertial(planet, model, &pos, 0.0);
        (PointMassIntegrator::new(coords, 0.0, pos, vel), mu, orbit.period(mu))
    }

    #[test]
    fn circular_orbit_conserves_energy() {
        let (mut integ, mu, period) = leo(GravityModel::Spherical);
        let e0 = integ.state().specific_energy(mu);
        let r0 = integ.state().radius();
        let dt = 300.0;
        let steps = (period / dt).ceil() as usize;
        for _ in 0..steps {
            integ.step(dt, &Vector3::zeros()).unwrap();
        }
        let s = integ.state();
        assert_relative_eq!(s.specific_energy(mu), e0, max_relative = 1e-6);
        assert_relative_eq!(s.radius(), r0, max_relative = 1e-6);
        assert_abs_diff_eq!(s.time, steps as f64 * dt, epsilon = 1e-9);
    }

    #[test]
    fn coordinates_follow_state() {
        let (mut integ, _, _) = leo(GravityModel::Oblate);
        let s = integ.step(120.0, &Vector3::zeros()).unwrap();
        let planet = *integ.coordinates().planet();
        let expected = Coordinates::from_inertial(planet, GravityModel::Oblate, &s.position, s.time);
        assert_eq!(integ.coordinates(), &expected);
        assert_relative_eq!(integ.coordinates().radius(), s.radius(), max_relative = 1e-12);
    }

    #[test]
    fn thrust_cancelling_gravity_holds_position() {
        let planet = Planet::earth();
        let coords = Coordinates::from_degrees(planet, GravityModel::Spherical, 10.0, 45.0, 1_000.0).unwrap();
        let (s_i0, _) = coords.inertial_position(0.0);
        let hover = -coords.gravity_g();
        let mut integ = PointMassIntegrator::new(coords, 0.0, s_i0, Vector3::zeros());
        for _ in 0..10 {
            integ.step(1.0, &hover).unwrap();
        }
        assert_abs_diff_eq!(integ.state().position, s_i0, epsilon = 1e-6);
        // The planet turned underneath the point.
        assert!(integ.coordinates().longitude() < coords.longitude());
    }

    #[test]
    fn custom_solver_is_used() {
        use crate::sim::integrator::SolverConfig;
        let planet = Planet::earth();
        let coords = Coordinates::from_degrees(planet, GravityModel::Spherical, 0.0, 0.0, 0.0).unwrap();
        let (s_i0, tgi) = coords.inertial_position(0.0);
        let up = tgi.tr_mul(&Vector3::new(0.0, 0.0, -100.0));
        let solver = StormerExtrapolation::new(SolverConfig {
            max_step: 0.5,
            ..SolverConfig::default()
        });
        let mut integ = PointMassIntegrator::with_solver(solver, coords, 0.0, s_i0, up);
        let s = integ.step(2.0, &Vector3::zeros()).unwrap();
        assert_eq!(integ.solver().stats().accepted, 4);
        assert!(integ.coordinates().elevation() > 150.0);
        assert!(s.radius() > planet.radius);
        let back = integ.into_coordinates();
        assert_eq!(back.model(), GravityModel::Spherical);
    }

    #[test]
    fn rejects_non_positive_step() {
        let (mut integ, _, _) = leo(GravityModel::Spherical);
        let before = integ.state();
        let coords = *integ.coordinates();
        for dt in [-10.0, 0.0, f64::NAN, f64::INFINITY] {
            let err = integ.step(dt, &Vector3::zeros()).unwrap_err();
            assert!(matches!(err, GncError::InvalidTimeStep(_)));
        }
        assert_eq!(integ.state(), before);
        assert_eq!(integ.coordinates(), &coords);
        assert_eq!(integ.solver().stats().evaluations, 0);
    }
}
