use serde::Serialize;

use crate::core::time::DateTime;

use super::{HeatSource, HeatingDecision};

/// Consecutive transitions with a failed device command before the loop raises an alarm.
pub const COMMAND_FAILURE_ALARM_THRESHOLD: u32 = 3;

/// The single piece of long-lived control state. Owned by the scheduler and only mutated there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    active_source: Option<HeatSource>,
    consecutive_command_failures: u32,
    last_decision: Option<HeatingDecision>,
    last_cycle_at: Option<DateTime>,
}

/// Read-only copy of [`ControlState`] handed out to status readers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControlSnapshot {
    pub active_source: Option<HeatSource>,
    pub last_decision: Option<HeatingDecision>,
    pub last_cycle_at: Option<DateTime>,
    pub consecutive_command_failures: u32,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_source(&self) -> Option<HeatSource> {
        self.active_source
    }

    pub fn consecutive_command_failures(&self) -> u32 {
        self.consecutive_command_failures
    }

    pub fn is_active(&self, source: HeatSource) -> bool {
        self.active_source == Some(source)
    }

    /// Records the intended source after a transition was attempted. The state follows the
    /// decision even if a device command failed; failures only feed the alarm counter.
    pub fn complete_transition(&mut self, source: HeatSource, all_commands_succeeded: bool) {
        self.active_source = Some(source);

        if all_commands_succeeded {
            self.consecutive_command_failures = 0;
        } else {
            self.consecutive_command_failures = self.consecutive_command_failures.saturating_add(1);
        }
    }

    pub fn alarm_raised(&self) -> bool {
        self.consecutive_command_failures >= COMMAND_FAILURE_ALARM_THRESHOLD
    }

    pub fn record_cycle(&mut self, decision: HeatingDecision, at: DateTime) {
        self.last_decision = Some(decision);
        self.last_cycle_at = Some(at);
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            active_source: self.active_source,
            last_decision: self.last_decision,
            last_cycle_at: self.last_cycle_at,
            consecutive_command_failures: self.consecutive_command_failures,
        }
    }
}
