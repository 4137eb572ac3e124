//! Book Info Agent
//!
//! Runs a monitored synthetic business transaction, "Frobulate Book Info",
//! over and over: fetch a random work from the book content service, parse
//! it, attach its fields to the transaction, and record a simulated
//! persistence call.
//!
//! # Design Principles
//! - Sequential: one transaction open at a time, spans strictly ordered
//! - Explicit context: the transaction handle is passed, never looked up
//! - Balanced: every dependency span that begins also ends

pub mod client;
pub mod engine;
pub mod error;
pub mod parser;
pub mod telemetry;

// Re-export contracts
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use contracts::*;
pub use error::{AgentError, Result};
