//! Item-count progress tracking across pagination cycles.

/// Outcome of feeding one observed count to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSignal {
    /// The count grew; keep going.
    Progressed,
    /// No growth, but the no-progress budget is not spent; back off and retry.
    Stalled,
    /// No growth for `max_no_progress` consecutive observations.
    Exhausted,
}

/// Counters for one pagination run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub last_observed_count: usize,
    pub consecutive_no_progress: u32,
}

/// Decides "still growing" vs "stalled" vs "exhausted".
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    state: ProgressState,
    max_no_progress: u32,
}

impl ProgressTracker {
    pub fn new(max_no_progress: u32) -> Self {
        Self {
            state: ProgressState::default(),
            max_no_progress,
        }
    }

    /// Record `current` and classify it against the highest count seen.
    pub fn observe(&mut self, current: usize) -> ProgressSignal {
        if current > self.state.last_observed_count {
            self.state.last_observed_count = current;
            self.state.consecutive_no_progress = 0;
            return ProgressSignal::Progressed;
        }

        self.state.consecutive_no_progress += 1;
        if self.state.consecutive_no_progress < self.max_no_progress {
            ProgressSignal::Stalled
        } else {
            ProgressSignal::Exhausted
        }
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn last_observed_count(&self) -> usize {
        self.state.last_observed_count
    }
}
