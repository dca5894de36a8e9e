//! Fixed-step operating-day clock.
//!
//! The day is a contiguous grid of intervals (default 96 steps of 15
//! minutes). The runner advances the clock exactly once per step, after all
//! systems for that step have run.

use bevy_ecs::prelude::Resource;

#[derive(Debug, Clone, Resource)]
pub struct StepClock {
    step: usize,
    horizon: usize,
    minutes_per_step: u32,
}

impl StepClock {
    pub fn new(horizon: usize, minutes_per_step: u32) -> Self {
        Self {
            step: 0,
            horizon,
            minutes_per_step,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Fractional hour of day for the current step.
    pub fn hour(&self) -> f64 {
        (self.step as u32 * self.minutes_per_step) as f64 / 60.0
    }

    /// Wall-clock label for the current step ("HH:MM").
    pub fn time_label(&self) -> String {
        let minutes = self.step as u32 * self.minutes_per_step;
        format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
    }

    pub fn advance(&mut self) {
        self.step += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.horizon
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new(96, 15)
    }
}
