//! FlowMancer Core
//!
//! Core types shared by the FlowMancer engine, server, client and CLI.
//!
//! This crate contains:
//! - Domain types: workflow definitions, execution records, stage context
//! - DTOs: request/response shapes exchanged over the HTTP API

pub mod domain;
pub mod dto;
