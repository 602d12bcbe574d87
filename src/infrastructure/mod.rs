pub mod completions;
pub mod feeds;
pub mod memory;
