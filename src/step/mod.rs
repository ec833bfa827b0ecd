//! The step graph: typed steps stored in an arena and linked by id.

pub mod definition;
pub mod graph;
pub mod naming;

pub use definition::*;
pub use graph::*;
pub use naming::*;
