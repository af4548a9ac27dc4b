//! Domain types for moodplan
//!
//! Value types shared by the planner, the auth providers and the controller:
//! the generated ActionPlan and the signed-in Session.

mod plan;
mod session;

pub use plan::{ActionPlan, DayPlan};
pub use session::Session;
