use dla_field::{topology, Field};
use tracing::debug;

/// How often (in frames) progress is logged during a run
const PROGRESS_INTERVAL: u64 = 500;

/// Outcome of driving a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub stuck: usize,
    pub wandering: usize,
    /// Longest sticky chain in the aggregate
    pub tallest: usize,
    /// False when the run stopped on the tick limit
    pub complete: bool,
}

/// Driver state: paces the field frame by frame
pub struct App {
    pub field: Field,
    pub steps_per_frame: usize,
    pub max_ticks: Option<u64>,
    pub frames: u64,
}

impl App {
    pub fn new(field: Field, steps_per_frame: usize, max_ticks: Option<u64>) -> Self {
        Self {
            field,
            steps_per_frame: steps_per_frame.max(1),
            max_ticks,
            frames: 0,
        }
    }

    /// Run simulation steps for the current frame. Returns true while work remains.
    pub fn tick(&mut self) -> bool {
        self.frames += 1;
        for _ in 0..self.steps_per_frame {
            if self.limit_reached() || !self.field.next_state() {
                return false;
            }
        }
        !self.limit_reached()
    }

    fn limit_reached(&self) -> bool {
        self.max_ticks.is_some_and(|limit| self.field.tick() >= limit)
    }

    /// Run frames until the field settles or the tick limit is hit
    pub fn run_to_completion(&mut self) -> RunSummary {
        while self.tick() {
            if self.frames % PROGRESS_INTERVAL == 0 {
                debug!(
                    ticks = self.field.tick(),
                    stuck = self.field.stuck_count(),
                    wandering = self.field.wandering_count(),
                    "progress"
                );
            }
        }
        self.summary()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.field.tick(),
            stuck: self.field.stuck_count(),
            wandering: self.field.wandering_count(),
            tallest: topology::find_tallest(&self.field),
            complete: self.field.is_complete(),
        }
    }
}
