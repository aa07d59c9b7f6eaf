pub mod elliptical;
pub mod root_finding;

pub use elliptical::{Elliptical, OrbitPlane};
pub use root_finding::newton_raphson;
