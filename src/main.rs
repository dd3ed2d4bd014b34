#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use rocket::{Build, Rocket, State};
use solaxcloud_rs::api::FetchClient;
use solaxcloud_rs::{api, mapper};
use std::sync::Mutex;
use std::time::Instant;

mod metrics;

/// Documented default refresh cadence of the cloud API.
const DEFAULT_INTERVAL_SECS: i64 = 300;

#[derive(Clone, serde::Deserialize)]
pub struct SolaxConfig {
    token_id: String,
    serial_number: String,
    api_base_url: Option<String>,
    interval: u64,
}

/// Structure containing state for API handlers.
pub struct StateData {
    client: FetchClient,
    serial_number: String,
    interval: u64,
    /// Timestamp of last successful metric collection via `metrics::collect()`
    timestamp: Mutex<Option<Instant>>,
}

impl StateData {
    /// Updates `timestamp` to `now()`.
    fn touch(&self) {
        if let Ok(mut ts) = self.timestamp.lock() {
            *ts = Some(Instant::now());
        } else {
            log::trace!("Unable to lock timestamp mutex, will refresh again")
        }
    }

    /// Checks whether `interval_secs` elapsed since last `touch()`
    fn interval_elapsed(&self, interval_secs: u64) -> bool {
        let elapsed_opt = self
            .timestamp
            .lock()
            .ok()
            .and_then(|a| a.map(|b| b.elapsed().as_secs()));

        if let Some(elapsed) = elapsed_opt {
            elapsed > interval_secs
        } else {
            /* If there is None timestamp/elapsed, always return true to trigger action */
            true
        }
    }
}

pub fn read_settings() -> SolaxConfig {
    let mut settings = Config::default();
    settings
        .merge(config::Environment::with_prefix("SOLAX"))
        .unwrap()
        .set_default("interval", DEFAULT_INTERVAL_SECS)
        .unwrap();

    settings.try_into().expect("Configuration error")
}

#[get("/metrics")]
async fn metrics_route(state: &State<StateData>) -> Result<String, api::Error> {
    if state.interval_elapsed(state.interval) {
        metrics::collect(&state.client, &state.serial_number).await?;
        state.touch();
    } else {
        log::info!("interval time not yet elapsed since last run; returning cached result")
    }
    metrics::read().await
}

#[get("/realtime")]
async fn realtime_route(state: &State<StateData>) -> Result<String, api::Error> {
    let data = state.client.fetch().await?;
    let metrics = mapper::map(&data);

    Ok(format!("{:#?}", metrics))
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let settings = read_settings();
    let credentials = solaxcloud_rs::credentials(
        settings.token_id,
        settings.serial_number.clone(),
        settings.api_base_url,
    );
    let client = FetchClient::new(credentials).expect("HTTP client error");
    let state = StateData {
        client,
        serial_number: settings.serial_number,
        interval: settings.interval,
        timestamp: Mutex::new(None),
    };

    rocket::build()
        .manage(state)
        .mount("/", routes![metrics_route, realtime_route])
}
