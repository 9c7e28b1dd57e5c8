mod control_state;
mod cost_model;
mod scheduler;

pub use control_state::{ControlSnapshot, ControlState};
pub use cost_model::{CostModelConfig, effective_heat_pump_capacity};
pub use scheduler::{Collaborators, CycleOutcome, HeatingScheduler, ScheduleSettings};

use derive_more::Display;
use serde::Serialize;

use crate::core::time::DateTime;
use crate::core::unit::{DegreeCelsius, KiloWatt, SpotPrice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatSource {
    #[display("heatpump")]
    HeatPump,
    #[display("pelletstove")]
    PelletStove,
}

impl HeatSource {
    pub fn other(&self) -> Self {
        match self {
            HeatSource::HeatPump => HeatSource::PelletStove,
            HeatSource::PelletStove => HeatSource::HeatPump,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub spot_price: SpotPrice,
    pub fetched_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatingDecision {
    pub source: HeatSource,
    pub assumed_capacity: KiloWatt,
}

/// One row of the decision log, written once per completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime,
    pub spot_price: SpotPrice,
    pub outdoor_temperature: DegreeCelsius,
    pub source: HeatSource,
    pub capacity: KiloWatt,
}
