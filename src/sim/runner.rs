use log::{debug, info};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::event::{EventDetector, EventKind, SimEvent};
use super::integrator::SecondOrderSolver;
use super::point_mass::{IntegratorState, PointMassIntegrator};
use crate::error::{GncError, Result};

// ---------------------------------------------------------------------------
// Configuration and samples
// ---------------------------------------------------------------------------

/// Trajectory run settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub dt: f64,       // s, output interval and integrator step
    pub max_time: f64, // s, measured from the initial epoch
    /// Stop on impact: elevation back at or below this value after having
    /// been above it.
    pub ground_elevation: Option<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 1.0,
            max_time: 3600.0,
            ground_elevation: None,
        }
    }
}

/// Integrator state together with the coordinates it maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub state: IntegratorState,
    pub longitude: f64, // rad
    pub latitude: f64,  // rad
    pub elevation: f64, // m
}

impl Sample {
    pub fn of<S: SecondOrderSolver>(integrator: &PointMassIntegrator<S>) -> Self {
        let coords = integrator.coordinates();
        Sample {
            state: integrator.state(),
            longitude: coords.longitude(),
            latitude: coords.latitude(),
            elevation: coords.elevation(),
        }
    }

    /// Rate of change of the distance to the planet centre, m/s.
    pub fn radial_velocity(&self) -> f64 {
        self.state.position.dot(&self.state.velocity) / self.state.radius()
    }
}

// ---------------------------------------------------------------------------
// Trajectory runs
// ---------------------------------------------------------------------------

/// Run a trajectory with an external acceleration and event detectors.
///
/// `accel` returns the geographic-frame external acceleration applied over
/// the next step. Returns every sample (initial state included) and the
/// events in the order they were detected. Fails with
/// [`GncError::InvalidTimeStep`] before stepping if `config.dt` is not
/// positive and finite.
pub fn simulate_with<S: SecondOrderSolver>(
    integrator: &mut PointMassIntegrator<S>,
    config: &SimConfig,
    accel: &mut dyn FnMut(&Sample) -> Vector3<f64>,
    detectors: &mut [Box<dyn EventDetector>],
) -> Result<(Vec<Sample>, Vec<SimEvent>)> {
    if !(config.dt > 0.0 && config.dt.is_finite()) {
        return Err(GncError::InvalidTimeStep(config.dt));
    }
    let mut sample = Sample::of(integrator);
    let t0 = sample.state.time;

    let capacity = (config.max_time / config.dt) as usize + 1;
    let mut trajectory = Vec::with_capacity(capacity.min(200_000));
    let mut events = Vec::new();
    trajectory.push(sample);

    let mut airborne = false;

    while sample.state.time - t0 < config.max_time {
        let a_g = accel(&sample);
        integrator.step(config.dt, &a_g)?;
        let next = Sample::of(integrator);

        for detector in detectors.iter_mut() {
            if let Some(kind) = detector.check(&sample, &next) {
                debug!("event {kind:?} at t={:.3}", next.state.time);
                events.push(SimEvent { time: next.state.time, kind, sample: next });
            }
        }
        trajectory.push(next);

        // Ground impact
        if let Some(ground) = config.ground_elevation {
            if next.elevation > ground {
                airborne = true;
            } else if airborne {
                events.push(SimEvent { time: next.state.time, kind: EventKind::Impact, sample: next });
                break;
            }
        }
        sample = next;
    }

    info!(
        "trajectory finished: {} samples, {} events, t={:.3} s",
        trajectory.len(),
        events.len(),
        trajectory.last().map_or(t0, |s| s.state.time)
    );
    Ok((trajectory, events))
}

/// Free flight under gravity alone, without event detection.
pub fn simulate<S: SecondOrderSolver>(
    integrator: &mut PointMassIntegrator<S>,
    config: &SimConfig,
) -> Result<Vec<Sample>> {
    simulate_with(integrator, config, &mut |_| Vector3::zeros(), &mut []).map(|(trajectory, _)| trajectory)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::{Coordinates, GravityModel};
    use crate::orbital::{Elliptical, OrbitPlane};
    use crate::planet::Planet;
    use crate::sim::event::{ApoapsisDetector, ElevationDetector, PeriapsisDetector};
    use std::f64::consts::PI;

    fn vertical_launch(speed: f64) -> PointMassIntegrator {
        let planet = Planet::earth();
        let coords = Coordinates::from_degrees(planet, GravityModel::Spherical, -58.4, -34.6, 0.0).unwrap();
        let (s_i0, tgi) = coords.inertial_position(0.0);
        let v_i0 = tgi.tr_mul(&Vector3::new(0.0, 0.0, -speed));
        PointMassIntegrator::new(coords, 0.0, s_i0, v_i0)
    }

    #[test]
    fn vertical_shot_lands() {
        let mut integ = vertical_launch(50.0);
        let config = SimConfig { dt: 0.01, max_time: 60.0, ground_elevation: Some(0.0) };
        let mut detectors: Vec<Box<dyn EventDetector>> = vec![
            Box::new(ApoapsisDetector),
            Box::new(ElevationDetector::new(100.0, true)),
        ];
        let (traj, events) = simulate_with(&mut integ, &config, &mut |_| Vector3::zeros(), &mut detectors).unwrap();

        let g = integ.coordinates().planet().gravitational_parameter() / 6_370_987f64.powi(2);
        let flight = 2.0 * 50.0 / g;
        let last = traj.last().unwrap();
        assert!(last.elevation <= 0.0);
        assert!((last.state.time - flight).abs() < 0.02, "t={}", last.state.time);

        let kinds: Vec<_> = events.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Elevation { elevation: 100.0, ascending: true },
                EventKind::Apoapsis,
                EventKind::Impact,
            ]
        );
        let apex = &events[1];
        assert!((apex.time - 0.5 * flight).abs() < 0.02);
        assert!((apex.sample.elevation - 50.0 * 50.0 / (2.0 * g)).abs() < 0.1);
    }

    #[test]
    fn stops_at_max_time_without_ground() {
        let mut integ = vertical_launch(10.0);
        let config = SimConfig { dt: 0.5, max_time: 10.0, ground_elevation: None };
        let traj = simulate(&mut integ, &config).unwrap();
        assert_eq!(traj.len(), 21);
        // Falls through the reference sphere: nothing stops it.
        assert!(traj.last().unwrap().elevation < 0.0);
    }

    #[test]
    fn orbit_apsides() {
        let planet = Planet::earth();
        let mu = planet.gravitational_parameter();
        let orbit = Elliptical::new(planet.radius + 1_000e3, planet.radius + 300e3).unwrap();
        let plane = OrbitPlane { inclination: 0.5, raan: 0.3, arg_periapsis: 1.0 };
        let nu0 = 0.1;
        let (pos, vel) = orbit.state_vector(mu, &plane, nu0);
        let coords = Coordinates::from_inertial(planet, GravityModel::Spherical, &pos, 0.0);
        let mut integ = PointMassIntegrator::new(coords, 0.0, pos, vel);

        let period = orbit.period(mu);
        let config = SimConfig { dt: 60.0, max_time: period, ground_elevation: None };
        let mut detectors: Vec<Box<dyn EventDetector>> =
            vec![Box::new(ApoapsisDetector), Box::new(PeriapsisDetector)];
        let (_, events) = simulate_with(&mut integ, &config, &mut |_| Vector3::zeros(), &mut detectors).unwrap();

        assert_eq!(events.len(), 2);
        let t_start = orbit.elapsed_since_periapsis(mu, nu0);
        let t_apo = orbit.elapsed_since_periapsis(mu, PI) - t_start;
        assert_eq!(events[0].kind, EventKind::Apoapsis);
        assert!(events[0].time >= t_apo && events[0].time < t_apo + 60.0);
        assert_eq!(events[1].kind, EventKind::Periapsis);
        assert!(events[1].time >= period - t_start && events[1].time < period - t_start + 60.0);
    }

    #[test]
    fn config_defaults_and_json() {
        let config: SimConfig = serde_json::from_str(r#"{"dt": 0.1, "ground_elevation": 25.0}"#).unwrap();
        assert_eq!(config.dt, 0.1);
        assert_eq!(config.max_time, SimConfig::default().max_time);
        assert_eq!(config.ground_elevation, Some(25.0));
    }

    #[test]
    fn rejects_invalid_time_step() {
        for dt in [0.0, -1.0, f64::NAN] {
            let mut integ = vertical_launch(10.0);
            let config = SimConfig { dt, max_time: 1.0, ground_elevation: None };
            let err = simulate(&mut integ, &config).unwrap_err();
            assert!(matches!(err, GncError::InvalidTimeStep(_)));
            assert_eq!(integ.state().time, 0.0);
        }
    }
}
