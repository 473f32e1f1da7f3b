//! Domain data types
//!
//! Local meeting records and the Microsoft Graph wire representations they
//! are reconciled against.

pub mod graph;
pub mod meeting;

pub use graph::*;
pub use meeting::*;
