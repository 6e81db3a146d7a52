use std::time::Duration;

use crate::coordinator::Effect;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlsRequest {
    Toggle,
    Show,
    Hide,
}

/// Bookkeeping for the single delayed hide action.
#[derive(Debug, Default)]
pub struct ControlsTimer {
    last_token: u64,
    outstanding: Option<u64>,
}

impl ControlsTimer {
    pub fn outstanding(&self) -> Option<u64> {
        self.outstanding
    }

    /// Cancels the outstanding hide, if any, and schedules a new one.
    pub fn schedule(&mut self, delay: Duration, effects: &mut Vec<Effect>) -> u64 {
        self.cancel(effects);
        self.last_token += 1;
        self.outstanding = Some(self.last_token);
        effects.push(Effect::ScheduleHide {
            token: self.last_token,
            delay,
        });
        self.last_token
    }

    pub fn cancel(&mut self, effects: &mut Vec<Effect>) {
        if let Some(token) = self.outstanding.take() {
            effects.push(Effect::CancelHide { token });
        }
    }

    /// Consumes a firing. Returns false for a token that was superseded.
    pub fn fire(&mut self, token: u64) -> bool {
        if self.outstanding == Some(token) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }
}
