use derive_more::Display;
use serde::Deserialize;
use tokio::sync::watch;

use crate::core::resilience::{RetryExecutor, RetryPolicy, Sleeper, configured_delay};
use crate::core::time::Duration;
use crate::core::unit::DegreeCelsius;
use crate::observability;
use crate::port::{DataLogger, DeviceController, PriceSource, TemperatureSource};
use crate::t;

use super::{
    ControlSnapshot, ControlState, CostModelConfig, HeatSource, HeatingDecision, LogRecord, Quote,
    effective_heat_pump_capacity,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSettings {
    /// Pause before the next attempt when price or temperature couldn't be fetched
    #[serde(default = "default_missing_input_retry_secs")]
    pub missing_input_retry_secs: u64,
}

fn default_missing_input_retry_secs() -> u64 {
    30
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            missing_input_retry_secs: default_missing_input_retry_secs(),
        }
    }
}

pub struct Collaborators<P, T, H, S, L> {
    pub price_source: P,
    pub temperature_source: T,
    pub heat_pump: H,
    pub pellet_stove: S,
    pub data_logger: L,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    Completed(HeatingDecision),
    InputUnavailable,
}

#[derive(Debug, Clone, Copy, Display)]
enum Power {
    #[display("on")]
    On,
    #[display("off")]
    Off,
}

pub struct HeatingScheduler<P, T, H, S, L, Z> {
    collaborators: Collaborators<P, T, H, S, L>,
    cost_model: CostModelConfig,
    retry: RetryExecutor<Z>,
    sleeper: Z,
    missing_input_retry: Duration,
    state: ControlState,
    snapshot_tx: watch::Sender<ControlSnapshot>,
}

impl<P, T, H, S, L, Z> HeatingScheduler<P, T, H, S, L, Z>
where
    P: PriceSource,
    T: TemperatureSource,
    H: DeviceController,
    S: DeviceController,
    L: DataLogger,
    Z: Sleeper + Clone,
{
    pub fn new(
        collaborators: Collaborators<P, T, H, S, L>,
        cost_model: CostModelConfig,
        retry_policy: RetryPolicy,
        schedule: &ScheduleSettings,
        sleeper: Z,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(ControlSnapshot::default());

        Self {
            collaborators,
            cost_model,
            retry: RetryExecutor::new(retry_policy, sleeper.clone()),
            sleeper,
            missing_input_retry: configured_delay(schedule.missing_input_retry_secs),
            state: ControlState::new(),
            snapshot_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlSnapshot> {
        self.snapshot_tx.subscribe()
    }

    #[cfg(test)]
    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub async fn run(mut self) {
        tracing::info!("Starting heating control loop");

        loop {
            self.tick().await;
        }
    }

    /// One loop iteration: a cycle followed by the matching pause. A completed cycle waits for
    /// the next quarter hour, missing inputs only wait the short retry interval.
    pub async fn tick(&mut self) -> CycleOutcome {
        let outcome = self.run_cycle().await;

        let wait = match outcome {
            CycleOutcome::Completed(_) => {
                let now = t!(now);
                let wait = Duration::until_next_quarter_hour(&now);
                tracing::info!("Next cycle at {} (in {})", now + wait, wait);
                wait
            }
            CycleOutcome::InputUnavailable => {
                tracing::info!("Retrying cycle in {}", self.missing_input_retry);
                self.missing_input_retry
            }
        };

        self.sleeper.sleep(wait).await;
        outcome
    }

    #[tracing::instrument(name = "heating_cycle", skip(self))]
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let started = t!(now);

        let Some(quote) = self.fetch_quote().await else {
            tracing::warn!("No spot price available. Skipping cycle.");
            observability::cycle_skipped("spot_price");
            return CycleOutcome::InputUnavailable;
        };

        let Some(outdoor_temperature) = self.fetch_outdoor_temperature().await else {
            tracing::warn!("No outdoor temperature available. Skipping cycle.");
            observability::cycle_skipped("outdoor_temperature");
            return CycleOutcome::InputUnavailable;
        };

        tracing::debug!("Spot price {} as of {}", quote.spot_price, quote.fetched_at);
        observability::inputs_received(quote.spot_price, outdoor_temperature);

        let decision = self.decide(outdoor_temperature, &quote);
        self.apply_decision(&decision).await;
        self.check_systems().await;

        let now = t!(now);
        self.append_log(LogRecord {
            timestamp: now,
            spot_price: quote.spot_price,
            outdoor_temperature,
            source: decision.source,
            capacity: decision.assumed_capacity,
        })
        .await;

        self.state.record_cycle(decision, now);
        self.snapshot_tx.send_replace(self.state.snapshot());

        observability::cycle_completed(now.elapsed_since(started));
        CycleOutcome::Completed(decision)
    }

    async fn fetch_quote(&self) -> Option<Quote> {
        let source = &self.collaborators.price_source;
        self.retry
            .execute("fetch_spot_price", move || source.current_quote())
            .await
    }

    async fn fetch_outdoor_temperature(&self) -> Option<DegreeCelsius> {
        let source = &self.collaborators.temperature_source;
        self.retry
            .execute("fetch_outdoor_temperature", move || source.outdoor_temperature())
            .await
    }

    fn decide(&self, outdoor_temperature: DegreeCelsius, quote: &Quote) -> HeatingDecision {
        let decision = self.cost_model.decide(outdoor_temperature, quote.spot_price);

        let heat_pump_capacity = effective_heat_pump_capacity(outdoor_temperature);
        let heat_pump_cost = self.cost_model.heat_pump_cost(heat_pump_capacity, quote.spot_price);

        match decision.source {
            HeatSource::HeatPump => tracing::info!(
                "Heat pump selected at {}, {}, cost: {:.2}",
                outdoor_temperature,
                heat_pump_capacity,
                heat_pump_cost
            ),
            HeatSource::PelletStove => tracing::info!(
                "Pellet stove selected at {}. Heat pump cost {:.2} above {:.2} or capacity {} too low.",
                outdoor_temperature,
                heat_pump_cost,
                self.cost_model.adjusted_threshold(),
                heat_pump_capacity
            ),
        }

        observability::decision_made(&decision);
        decision
    }

    /// Turns on the decided source first and only then turns off the other one.
    async fn apply_decision(&mut self, decision: &HeatingDecision) {
        let target = decision.source;

        if self.state.is_active(target) {
            tracing::info!("{} is already active", target);
            return;
        }

        tracing::info!(
            "Switching from {} to {}",
            self.state
                .active_source()
                .map_or("nothing".to_string(), |s| s.to_string()),
            target
        );

        let turned_on = self.switch(target, Power::On).await;
        let turned_off = self.switch(target.other(), Power::Off).await;

        self.state.complete_transition(target, turned_on && turned_off);

        let alarm = self.state.alarm_raised();
        if alarm {
            tracing::error!(
                "Device commands failed in {} consecutive transitions. Heating may not match {}!",
                self.state.consecutive_command_failures(),
                target
            );
        }
        observability::device_command_alarm(alarm);
    }

    async fn switch(&self, source: HeatSource, power: Power) -> bool {
        let succeeded = match source {
            HeatSource::HeatPump => switch_device(&self.retry, &self.collaborators.heat_pump, power).await,
            HeatSource::PelletStove => switch_device(&self.retry, &self.collaborators.pellet_stove, power).await,
        };

        if !succeeded {
            tracing::error!("Failed to turn {} {}, continuing with intended state", source, power);
            observability::device_command_failed(source);
        }

        succeeded
    }

    async fn check_systems(&self) -> (bool, bool) {
        let heat_pump = &self.collaborators.heat_pump;
        let pellet_stove = &self.collaborators.pellet_stove;

        let (heat_pump_ok, pellet_stove_ok) =
            futures::join!(heat_pump.check_connection(), pellet_stove.check_connection());

        observability::device_availability(heat_pump.name(), heat_pump_ok);
        observability::device_availability(pellet_stove.name(), pellet_stove_ok);

        if !heat_pump_ok || !pellet_stove_ok {
            tracing::warn!(
                heat_pump = heat_pump_ok,
                pellet_stove = pellet_stove_ok,
                "One or more systems unavailable"
            );
        }

        (heat_pump_ok, pellet_stove_ok)
    }

    async fn append_log(&self, record: LogRecord) {
        if let Err(e) = self.collaborators.data_logger.append(&record).await {
            tracing::error!("Error logging heating data {:?}: {:?}", record, e);
        }
    }
}

async fn switch_device<D: DeviceController, Z: Sleeper>(retry: &RetryExecutor<Z>, device: &D, power: Power) -> bool {
    let operation = format!("{}_{}", device.name(), power);

    let result = match power {
        Power::On => retry.execute(&operation, move || device.turn_on()).await,
        Power::Off => retry.execute(&operation, move || device.turn_off()).await,
    };

    result.is_some()
}
