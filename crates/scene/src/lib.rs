pub mod camera;
pub mod derive;
pub mod marker;

pub use camera::*;
pub use derive::*;
pub use marker::*;
