use serde::Deserialize;

use crate::core::unit::{DegreeCelsius, KiloWatt, SpotPrice};

use super::{HeatSource, HeatingDecision};

/// Below this output the heat pump can't keep the house warm on its own.
const MIN_HEAT_PUMP_CAPACITY: KiloWatt = KiloWatt(3.0);

#[derive(Debug, Clone, Deserialize)]
pub struct CostModelConfig {
    /// Highest acceptable heat pump running cost, currency per hour
    #[serde(default = "default_max_price_threshold")]
    pub max_price_threshold: f64,
    /// Baseline cost component deducted from the threshold
    #[serde(default = "default_fixed_cost_adjustment")]
    pub fixed_cost_adjustment: f64,
    /// Seasonal coefficient of performance of the heat pump
    #[serde(default = "default_scop")]
    pub scop: f64,
    #[serde(default = "default_pellet_stove_capacity_kw")]
    pub pellet_stove_capacity_kw: f64,
}

fn default_max_price_threshold() -> f64 {
    3.0
}

fn default_fixed_cost_adjustment() -> f64 {
    0.94875
}

fn default_scop() -> f64 {
    3.8
}

fn default_pellet_stove_capacity_kw() -> f64 {
    5.0
}

impl Default for CostModelConfig {
    fn default() -> Self {
        Self {
            max_price_threshold: default_max_price_threshold(),
            fixed_cost_adjustment: default_fixed_cost_adjustment(),
            scop: default_scop(),
            pellet_stove_capacity_kw: default_pellet_stove_capacity_kw(),
        }
    }
}

/// Heat output the heat pump can still deliver at the given outdoor temperature.
pub fn effective_heat_pump_capacity(outdoor_temperature: DegreeCelsius) -> KiloWatt {
    let t = outdoor_temperature.0;

    if t >= 0.0 {
        KiloWatt(6.5)
    } else if t >= -12.5 {
        KiloWatt(4.0)
    } else if t >= -17.5 {
        KiloWatt(3.6)
    } else {
        KiloWatt(2.6)
    }
}

impl CostModelConfig {
    pub fn adjusted_threshold(&self) -> f64 {
        self.max_price_threshold - self.fixed_cost_adjustment
    }

    /// Cost of letting the heat pump deliver `capacity` for one hour at `spot_price`.
    pub fn heat_pump_cost(&self, capacity: KiloWatt, spot_price: SpotPrice) -> f64 {
        spot_price.cost_of(KiloWatt(capacity.0 / self.scop))
    }

    pub fn decide(&self, outdoor_temperature: DegreeCelsius, spot_price: SpotPrice) -> HeatingDecision {
        let capacity = effective_heat_pump_capacity(outdoor_temperature);
        let cost = self.heat_pump_cost(capacity, spot_price);

        if cost <= self.adjusted_threshold() && capacity >= MIN_HEAT_PUMP_CAPACITY {
            HeatingDecision {
                source: HeatSource::HeatPump,
                assumed_capacity: capacity,
            }
        } else {
            HeatingDecision {
                source: HeatSource::PelletStove,
                assumed_capacity: KiloWatt(self.pellet_stove_capacity_kw),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity(t: f64) -> f64 {
        effective_heat_pump_capacity(DegreeCelsius(t)).0
    }

    fn decide(t: i32, price: f64) -> HeatingDecision {
        CostModelConfig::default().decide(DegreeCelsius::from(t), SpotPrice(price))
    }

    #[test]
    fn capacity_bands() {
        for t in [0.0, 0.5, 5.0, 30.0] {
            assert_eq!(capacity(t), 6.5, "at {t}");
        }
        for t in [-0.5, -1.0, -12.0, -12.5] {
            assert_eq!(capacity(t), 4.0, "at {t}");
        }
        for t in [-12.6, -13.0, -17.0, -17.5] {
            assert_eq!(capacity(t), 3.6, "at {t}");
        }
        for t in [-17.6, -18.0, -30.0] {
            assert_eq!(capacity(t), 2.6, "at {t}");
        }
    }

    #[test]
    fn cheap_power_and_mild_weather_selects_heat_pump() {
        let decision = decide(5, 0.5);

        assert_eq!(decision.source, HeatSource::HeatPump);
        assert_eq!(decision.assumed_capacity, KiloWatt(6.5));
    }

    #[test]
    fn cost_calculation_matches_hand_computed_values() {
        let config = CostModelConfig::default();

        let cost = config.heat_pump_cost(KiloWatt(6.5), SpotPrice(0.5));

        assert!((cost - 0.855263).abs() < 1e-6);
        assert!((config.adjusted_threshold() - 2.05125).abs() < 1e-12);
    }

    #[test]
    fn expensive_power_selects_pellet_stove() {
        let decision = decide(5, 5.0);

        assert_eq!(decision.source, HeatSource::PelletStove);
        assert_eq!(decision.assumed_capacity, KiloWatt(5.0));
    }

    #[test]
    fn extreme_cold_always_selects_pellet_stove() {
        for price in [-1.0, 0.0, 0.01, 1.0, 10.0] {
            let decision = decide(-20, price);

            assert_eq!(decision.source, HeatSource::PelletStove, "at price {price}");
            assert_eq!(decision.assumed_capacity, KiloWatt(5.0));
        }
    }

    #[test]
    fn cold_but_capable_heat_pump_is_used_when_cheap() {
        let decision = decide(-15, 0.5);

        assert_eq!(decision.source, HeatSource::HeatPump);
        assert_eq!(decision.assumed_capacity, KiloWatt(3.6));
    }

    #[test]
    fn cost_exactly_at_threshold_selects_heat_pump() {
        let config = CostModelConfig {
            max_price_threshold: 1.0,
            fixed_cost_adjustment: 0.0,
            scop: 4.0,
            pellet_stove_capacity_kw: 5.0,
        };

        //4.0 kW / 4.0 * 1.0 == 1.0
        let decision = config.decide(DegreeCelsius::from(-5), SpotPrice(1.0));

        assert_eq!(decision.source, HeatSource::HeatPump);
    }

    #[test]
    fn decision_is_deterministic() {
        let config = CostModelConfig::default();

        for t in -25..=10 {
            for price in [0.1, 1.0, 4.0, 8.0] {
                let first = config.decide(DegreeCelsius::from(t), SpotPrice(price));
                let second = config.decide(DegreeCelsius::from(t), SpotPrice(price));
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn configured_pellet_capacity_is_reported() {
        let config = CostModelConfig {
            pellet_stove_capacity_kw: 8.0,
            ..CostModelConfig::default()
        };

        let decision = config.decide(DegreeCelsius::from(-20), SpotPrice(0.1));

        assert_eq!(decision.assumed_capacity, KiloWatt(8.0));
    }
}
