//! Session control: the per-window loop and the state it carries.

pub mod briefing;
pub mod budget;
pub mod control_loop;
pub mod stuck;

pub use budget::{BudgetVerdict, TimeoutBudget};
pub use control_loop::{ControlLoop, LoopSettings, RunSummary, WindowStep};
pub use stuck::StuckWindow;
