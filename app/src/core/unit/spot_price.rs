use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::KiloWatt;

/// Electricity price in currency per kWh, including whatever the price source bundles in (energy, tax).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
pub struct SpotPrice(pub f64);

impl SpotPrice {
    /// Cost of drawing `power` for one hour.
    pub fn cost_of(&self, power: KiloWatt) -> f64 {
        power.0 * self.0
    }
}

impl Display for SpotPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}/kWh", self.0)
    }
}

impl From<f64> for SpotPrice {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_of_one_hour() {
        let price = SpotPrice(0.5);

        assert_eq!(price.cost_of(KiloWatt(2.0)), 1.0);
    }
}
