//! Block-space geometry

pub mod region;

pub use region::{ColumnKey, Region};
