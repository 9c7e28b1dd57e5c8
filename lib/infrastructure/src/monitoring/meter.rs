use cached::proc_macro::cached;
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram};

const METER_SCOPE: &str = "heat_selector";

pub fn increment(name: &'static str, kv: &[(&str, &str)]) {
    counter(name).add(1, &attributes(kv))
}

pub fn set(name: &'static str, value: f64, kv: &[(&str, &str)]) {
    gauge(name).record(value, &attributes(kv))
}

pub fn observe_seconds(name: &'static str, seconds: f64, kv: &[(&str, &str)]) {
    histogram(name).record(seconds, &attributes(kv))
}

fn attributes(kv: &[(&str, &str)]) -> Vec<KeyValue> {
    kv.iter()
        .map(|(k, v)| KeyValue::new(k.to_string(), v.to_string()))
        .collect()
}

#[cached]
fn counter(name: &'static str) -> Counter<u64> {
    opentelemetry::global::meter(METER_SCOPE).u64_counter(name).build()
}

#[cached]
fn gauge(name: &'static str) -> Gauge<f64> {
    opentelemetry::global::meter(METER_SCOPE).f64_gauge(name).build()
}

#[cached]
fn histogram(name: &'static str) -> Histogram<f64> {
    opentelemetry::global::meter(METER_SCOPE)
        .f64_histogram(name)
        .with_unit("s")
        .build()
}
