#![allow(async_fn_in_trait)]

use anyhow::Result;

use crate::core::unit::DegreeCelsius;
use crate::heating::{LogRecord, Quote};

pub trait PriceSource {
    async fn current_quote(&self) -> Result<Quote>;
}

pub trait TemperatureSource {
    async fn outdoor_temperature(&self) -> Result<DegreeCelsius>;
}

pub trait DeviceController {
    fn name(&self) -> &str;

    async fn turn_on(&self) -> Result<()>;

    async fn turn_off(&self) -> Result<()>;

    //Reachability only, never fails. Errors are reported as unreachable.
    async fn check_connection(&self) -> bool;
}

pub trait DataLogger {
    async fn append(&self, record: &LogRecord) -> Result<()>;
}
