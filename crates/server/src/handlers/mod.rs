//! Request handlers, one module per resource.

pub mod collection;
pub mod health;
pub mod query;
pub mod upload;
