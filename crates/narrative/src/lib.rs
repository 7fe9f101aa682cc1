pub mod model;
pub mod node_id;
pub mod source;
pub mod store;

pub use model::*;
pub use node_id::*;
pub use source::*;
pub use store::*;
