//! Document aggregate and the entities it owns

pub mod document;
pub mod entity;

pub use document::*;
pub use entity::{Entity, Owner};
