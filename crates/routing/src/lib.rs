pub mod cache;
pub mod coordinator;
pub mod error;
pub mod provider;

pub use cache::*;
pub use coordinator::*;
pub use error::*;
pub use provider::*;
