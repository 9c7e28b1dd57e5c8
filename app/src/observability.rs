use infrastructure::meter::{increment, observe_seconds, set};

use crate::core::time::Duration;
use crate::core::unit::{DegreeCelsius, SpotPrice};
use crate::heating::{HeatSource, HeatingDecision};

const OPERATION: &str = "operation";
const SOURCE: &str = "source";
const REASON: &str = "reason";
const DEVICE: &str = "device";

pub fn retry_attempt_failed(operation: &str) {
    increment("heating_retry_failed_attempt", &[(OPERATION, operation)]);
}

pub fn retry_exhausted(operation: &str) {
    increment("heating_retry_exhausted", &[(OPERATION, operation)]);
}

pub fn inputs_received(spot_price: SpotPrice, outdoor_temperature: DegreeCelsius) {
    set("heating_spot_price", spot_price.0, &[]);
    set("heating_outdoor_temperature", outdoor_temperature.0, &[]);
}

pub fn decision_made(decision: &HeatingDecision) {
    let source = decision.source.to_string();
    set(
        "heating_assumed_capacity_kw",
        decision.assumed_capacity.0,
        &[(SOURCE, source.as_str())],
    );
}

pub fn device_command_failed(source: HeatSource) {
    let source = source.to_string();
    increment("heating_device_command_failed", &[(SOURCE, source.as_str())]);
}

pub fn device_command_alarm(raised: bool) {
    set("heating_device_command_alarm", if raised { 1.0 } else { 0.0 }, &[]);
}

pub fn device_availability(device: &str, reachable: bool) {
    set(
        "heating_device_reachable",
        if reachable { 1.0 } else { 0.0 },
        &[(DEVICE, device)],
    );
}

pub fn cycle_completed(duration: Duration) {
    increment("heating_cycle_completed", &[]);
    observe_seconds("heating_cycle_duration", duration.as_secs_f64(), &[]);
}

pub fn cycle_skipped(reason: &str) {
    increment("heating_cycle_skipped", &[(REASON, reason)]);
}
