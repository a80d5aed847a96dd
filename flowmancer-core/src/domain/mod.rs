//! Core domain types
//!
//! These types represent the fundamental business entities and are shared
//! between the engine (executes and persists them) and the client side
//! (reads them back over HTTP).

pub mod context;
pub mod execution;
pub mod workflow;
