//! Service Module
//!
//! Business logic between the HTTP handlers and the engine.

pub mod workflow;

pub use workflow as workflow_service;
