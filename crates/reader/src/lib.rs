pub mod consumer;
pub mod highlight;
pub mod session;

pub use consumer::*;
pub use highlight::*;
pub use session::*;
