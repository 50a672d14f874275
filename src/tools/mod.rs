//! Concrete tool implementations agents can be granted.

pub mod search;

pub use search::{SearchConfig, SearchTool};
