pub mod bounds;
pub mod coord;
pub mod place;
pub mod registry;

// Geo crate: small, well-tested geographic primitives only.
pub use bounds::*;
pub use coord::*;
pub use place::*;
pub use registry::*;
