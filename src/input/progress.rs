// src/input/progress.rs
use rand::Rng;

pub const SIMULATED_CEILING: f64 = 90.0;
pub const MAX_STEP: f64 = 15.0;

/// Cosmetic upload progress. The real transfer reports nothing, so the bar
/// creeps forward in random steps, parks below 100 and only completes when
/// the upload request resolves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadProgress {
    percent: f64,
    finished: bool,
}

impl UploadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn rounded(&self) -> u8 {
        self.percent.round().clamp(0.0, 100.0) as u8
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn tick(&mut self) -> f64 {
        let step = rand::thread_rng().gen_range(0.0..MAX_STEP);
        self.advance(step)
    }

    /// Add `step` percent, never passing the simulated ceiling.
    pub fn advance(&mut self, step: f64) -> f64 {
        if !self.finished {
            self.percent = (self.percent + step.max(0.0)).min(SIMULATED_CEILING);
        }
        self.percent
    }

    pub fn complete(&mut self) {
        self.percent = 100.0;
        self.finished = true;
    }

    pub fn fail(&mut self) {
        self.percent = 0.0;
        self.finished = false;
    }
}
