use std::fmt::Display;

use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
pub struct DegreeCelsius(pub f64);

impl From<i32> for DegreeCelsius {
    fn from(value: i32) -> Self {
        Self(f64::from(value))
    }
}

impl From<f64> for DegreeCelsius {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<DegreeCelsius> for f64 {
    fn from(value: DegreeCelsius) -> Self {
        value.0
    }
}

impl Display for DegreeCelsius {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} °C", self.0)
    }
}
