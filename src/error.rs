use thiserror::Error;

/// Construction and input errors raised at the library boundary.
///
/// Numerical non-convergence is not reported here: the inverse Kepler solve
/// returns `NaN` instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GncError {
    #[error("invalid orbit geometry: apoapsis={apoapsis:.5e} m, periapsis={periapsis:.5e} m")]
    InvalidOrbitGeometry { apoapsis: f64, periapsis: f64 },

    #[error("orbit eccentricity {0:.4} outside [0, 1); parabolic and hyperbolic orbits are not supported")]
    UnsupportedEccentricity(f64),

    #[error("elevation {elevation:.1} m is below the planet centre (reference radius {radius:.1} m)")]
    ElevationBelowCenter { elevation: f64, radius: f64 },

    #[error("unknown reference frame tag '{0}'")]
    UnknownFrame(String),

    #[error("degenerate state vector: {0}")]
    DegenerateState(&'static str),

    #[error("time step {0} s must be positive and finite")]
    InvalidTimeStep(f64),
}

pub type Result<T> = std::result::Result<T, GncError>;
