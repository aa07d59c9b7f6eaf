pub mod atmosphere;
pub mod gravity;

pub use atmosphere::{isa, Atmo};
pub use gravity::{oblate_gravity_g, spherical_gravity_g};
