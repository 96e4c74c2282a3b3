//! Application server assembled on top of the lifecycle orchestrator.
//!
//! The binary wires configuration, the database pool and the HTTP listener
//! into lifecycle services, registers them in startup order and hands control
//! to the manager.

pub mod config;
pub mod database;
pub mod services;
pub mod web;
