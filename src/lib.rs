//! Point-mass trajectory propagation around a rotating, oblate planet.
//!
//! Positions are integrated in the inertial frame; gravity is evaluated in
//! the local geographic frame (North, East, Down) of a [`Coordinates`]
//! system bound to a [`Planet`].

pub mod coordinates;
pub mod error;
pub mod frames;
pub mod orbital;
pub mod physics;
pub mod planet;
pub mod sim;

pub use coordinates::{normalize_angle, Coordinates, GravityModel};
pub use error::{GncError, Result};
pub use frames::{geographic_from_elevation_bearing, Frame, Orientation};
pub use orbital::{Elliptical, OrbitPlane};
pub use planet::Planet;
pub use sim::{IntegratorState, PointMassIntegrator, SimConfig, SolverConfig, StormerExtrapolation};
