pub mod clipboard;
pub mod config;
pub mod context;
pub mod errors;
pub mod extraction;
pub mod grab;
pub mod graph;
pub mod resolution;
pub mod types;
