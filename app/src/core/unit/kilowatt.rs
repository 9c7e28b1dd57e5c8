use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
pub struct KiloWatt(pub f64);

impl Display for KiloWatt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} kW", self.0)
    }
}

impl From<f64> for KiloWatt {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<KiloWatt> for f64 {
    fn from(value: KiloWatt) -> Self {
        value.0
    }
}
