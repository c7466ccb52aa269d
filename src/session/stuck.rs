//! Sliding-window detection of an episode that stopped advancing.

use std::collections::VecDeque;

/// Last `K` normal progress samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuckWindow {
    threshold: usize,
    samples: VecDeque<String>,
}

impl StuckWindow {
    /// Window over the last `threshold` samples. A threshold of zero is
    /// treated as one.
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            threshold,
            samples: VecDeque::with_capacity(threshold),
        }
    }

    /// Record a sample; returns whether the window is now full of one
    /// identical value.
    pub fn push(&mut self, sample: &str) -> bool {
        if self.samples.len() == self.threshold {
            self.samples.pop_front();
        }
        self.samples.push_back(sample.to_owned());
        self.is_stuck()
    }

    /// Whether the last `K` samples are all identical.
    #[must_use]
    pub fn is_stuck(&self) -> bool {
        self.samples.len() == self.threshold
            && self.samples.iter().all(|s| Some(s) == self.samples.front())
    }

    /// Forget everything, e.g. at the start of an episode.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
