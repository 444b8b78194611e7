//! FSRS-5 weight table.
//!
//! Index layout:
//! - w0..w3: initial stability for Again, Hard, Good, Easy
//! - w4, w5: initial difficulty
//! - w6, w7: difficulty update and mean reversion
//! - w8..w10: stability gain after a successful review
//! - w11..w14: stability after a lapse
//! - w15, w16: hard penalty and easy bonus
//! - w17, w18: short-term factors, used here to bound post-lapse stability

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::grade::Grade;

pub const WEIGHT_COUNT: usize = 19;

/// Published FSRS-5 default weights
pub const DEFAULT_WEIGHTS: [f64; WEIGHT_COUNT] = [
    0.40255, 1.18385, 3.173, 15.69105, // w0-w3: initial stability
    7.1949, 0.5345, // w4-w5: initial difficulty
    1.4604, 0.0046, // w6-w7: difficulty update
    1.54575, 0.1192, 1.01925, // w8-w10: recall stability
    1.9395, 0.11, 0.29605, 2.2698, // w11-w14: forget stability
    0.2315, 2.9898, // w15-w16: hard penalty, easy bonus
    0.51655, 0.6621, // w17-w18
];

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Floor for any stability the scheduler produces
pub const MIN_STABILITY: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    w: [f64; WEIGHT_COUNT],
}

impl Default for Parameters {
    fn default() -> Self {
        Self { w: DEFAULT_WEIGHTS }
    }
}

impl Parameters {
    pub fn new(w: [f64; WEIGHT_COUNT]) -> Result<Self, SchedulerError> {
        let params = Self { w };
        params.validate()?;
        Ok(params)
    }

    pub fn weights(&self) -> &[f64; WEIGHT_COUNT] {
        &self.w
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if let Some(i) = self.w.iter().position(|w| !w.is_finite()) {
            return Err(SchedulerError::InvalidConfig(format!(
                "weight w{i} is not finite"
            )));
        }
        if let Some(i) = self.w[..4].iter().position(|&w| w <= 0.0) {
            return Err(SchedulerError::InvalidConfig(format!(
                "initial stability w{i} must be positive"
            )));
        }
        Ok(())
    }

    /// Starting stability for a card first rated `grade`
    pub fn initial_stability(&self, grade: Grade) -> f64 {
        self.w[grade.index()].max(MIN_STABILITY)
    }

    /// Starting difficulty for a card first rated `grade`
    pub fn initial_difficulty(&self, grade: Grade) -> f64 {
        let g = f64::from(grade.rating());
        clamp_difficulty(self.w[4] - (self.w[5] * (g - 1.0)).exp() + 1.0)
    }

    /// Difficulty after a review, damped near the upper bound and pulled
    /// toward the Easy starting difficulty
    pub fn next_difficulty(&self, d: f64, grade: Grade) -> f64 {
        let g = f64::from(grade.rating());
        let delta = -self.w[6] * (g - 3.0);
        let damped = d + delta * (MAX_DIFFICULTY - d) / 9.0;
        let target = self.initial_difficulty(Grade::Easy);
        clamp_difficulty(self.w[7] * target + (1.0 - self.w[7]) * damped)
    }

    /// Stability after a successful review at retrievability `r`
    pub fn recall_stability(&self, d: f64, s: f64, r: f64, grade: Grade) -> f64 {
        let hard_penalty = if grade == Grade::Hard { self.w[15] } else { 1.0 };
        let easy_bonus = if grade == Grade::Easy { self.w[16] } else { 1.0 };
        let growth = self.w[8].exp()
            * (11.0 - d)
            * s.powf(-self.w[9])
            * ((1.0 - r) * self.w[10]).exp_m1()
            * hard_penalty
            * easy_bonus;
        // growth is non-negative for r in [0, 1] and d in [1, 10]
        (s * (1.0 + growth.max(0.0))).max(MIN_STABILITY)
    }

    /// Stability after a lapse at retrievability `r`.
    ///
    /// Strictly below `s` while `s` is above [`MIN_STABILITY`]; a state
    /// already at or below the floor keeps its stability.
    pub fn forget_stability(&self, d: f64, s: f64, r: f64) -> f64 {
        let post_lapse = self.w[11]
            * d.powf(-self.w[12])
            * ((s + 1.0).powf(self.w[13]) - 1.0)
            * ((1.0 - r) * self.w[14]).exp();
        let ceiling = s / (self.w[17] * self.w[18]).exp();
        post_lapse.min(ceiling).max(MIN_STABILITY.min(s))
    }
}

pub fn clamp_difficulty(d: f64) -> f64 {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}
