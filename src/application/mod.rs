//! Application services layer.

pub mod docs;
pub mod error;
pub mod render;
