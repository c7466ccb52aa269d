//! Carried-over decision time budget.
//!
//! A slow decision does not just cost its own window: whatever it overran
//! by is owed by the next window. The deficit is paid off by the next
//! decision that finishes inside what is left of its budget.

use std::time::Duration;

/// Result of charging a decision against the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetVerdict {
    /// The decision, plus any carried deficit, fit in one window.
    WithinBudget,
    /// It did not; the excess is carried into the next window.
    Overrun,
}

/// Per-window timeout with an additive carried deficit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    window: Duration,
    deficit: Duration,
}

impl TimeoutBudget {
    /// Budget of `window` per decision, starting with no deficit.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deficit: Duration::ZERO,
        }
    }

    /// Per-window allowance.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Time still owed from earlier windows.
    #[must_use]
    pub fn deficit(&self) -> Duration {
        self.deficit
    }

    /// The carried deficit alone already exceeds a whole window, so asking
    /// the agent now cannot possibly be on time.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.deficit > self.window
    }

    /// Spend this window without asking for a decision, paying off one
    /// window's worth of deficit.
    pub fn skip_window(&mut self) {
        self.deficit = self.deficit.saturating_sub(self.window);
    }

    /// Charge a decision that took `elapsed`.
    pub fn charge(&mut self, elapsed: Duration) -> BudgetVerdict {
        let total = self.deficit.saturating_add(elapsed);
        if total > self.window {
            self.deficit = total - self.window;
            BudgetVerdict::Overrun
        } else {
            self.deficit = Duration::ZERO;
            BudgetVerdict::WithinBudget
        }
    }
}
