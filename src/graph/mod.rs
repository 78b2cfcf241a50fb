/// Breadth-first symbol closure over the import graph.
pub mod closure;

pub use closure::ClosureEngine;
