//! Turning instructions into actions
//!
//! Short instructions get one action from the [`IntentPlanner`]; instructions
//! the [`needs_planning`] gate flags get an ordered plan from the
//! [`MultiStepPlanner`]. Both fall back to a plain chat reply when the model
//! answers with something unusable.

mod heuristic;
mod intent;
mod plan;
mod reply;

pub use heuristic::needs_planning;
pub use intent::IntentPlanner;
pub use plan::{confirm_plan, ExecutionPlan, MultiStepPlanner};
