//! Shared, hand-written test shapes for trellis4rs crates.

pub mod defaults;
pub mod enums;
pub mod nested;
pub mod recursive;
pub mod shapes;
pub mod unions;
