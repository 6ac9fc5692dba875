//! Instruction handling
//!
//! The orchestrator picks single-action or planned execution for each
//! instruction, runs it, and records the outcome in memory.

mod orchestrator;

pub use orchestrator::Orchestrator;
