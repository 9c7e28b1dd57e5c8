use crate::core::resilience::TokioSleeper;

use crate::heating::{Collaborators, HeatingScheduler};
use crate::settings::Settings;

mod adapter;
mod core;
mod heating;
mod observability;
pub mod port;
mod settings;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    settings.monitoring.init().expect("Error initializing monitoring");

    let collaborators = Collaborators {
        price_source: settings
            .tibber
            .new_price_source()
            .expect("Error initializing Tibber price source"),
        temperature_source: settings
            .smhi
            .new_temperature_source()
            .expect("Error initializing SMHI temperature source"),
        heat_pump: settings
            .sensibo
            .new_controller()
            .expect("Error initializing Sensibo heat pump controller"),
        pellet_stove: settings
            .pellet_stove
            .new_controller()
            .expect("Error initializing pellet stove controller"),
        data_logger: settings.data_log.new_logger(),
    };

    let scheduler = HeatingScheduler::new(
        collaborators,
        settings.heating,
        settings.retry,
        &settings.schedule,
        TokioSleeper,
    );

    let http_server_exec = {
        let status = scheduler.subscribe();
        let http_server = settings.http_server;

        async move {
            match http_server {
                Some(server) => server
                    .run_server(move || vec![adapter::status::new_routes(status.clone())])
                    .await
                    .expect("HTTP server execution failed"),
                None => {
                    tracing::info!("No HTTP server configured, status endpoint disabled");
                    std::future::pending::<()>().await
                }
            }
        }
    };

    tracing::info!("Starting main loop");

    tokio::select!(
        _ = scheduler.run() => {},
        _ = http_server_exec => {},
    );
}
