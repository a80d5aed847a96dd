//! Data Transfer Objects
//!
//! Request and response shapes exchanged between the server, the client
//! and external integrations. Domain entities are returned as-is; these
//! types only cover what has no domain counterpart.

pub mod execution;
pub mod webhook;
pub mod workflow;
