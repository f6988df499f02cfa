//! Fact store: typed, insertion-ordered assertions about initiatives.

pub mod schema;
pub mod store;
pub mod value;

pub use schema::{RelationRegistry, RelationSchema};
pub use store::{FactStore, Tuple};
pub use value::{Value, ValueKind};
