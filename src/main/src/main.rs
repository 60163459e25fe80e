use anyhow::{Context, Result};
use log::*;
use std::thread;
use time::OffsetDateTime;

use control::collect_samples;

mod config;
mod cycle;
mod logging;
mod playback;
mod speaker;
mod telemetry;
mod trigger_state;

use config::Config;
use cycle::{Cycle, Outcome};
use speaker::SonosSpeaker;
use telemetry::LiveMeasurements;
use trigger_state::TriggerStore;

fn main() -> Result<()> {
    // A missing .env is fine, the variables may come from the scheduler
    dotenv::dotenv().ok();

    let config = Config::read().context("Unable to load configuration")?;
    logging::init(config.log_path.as_deref())?;

    if let Err(e) = run(&config) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

fn run(config: &Config) -> Result<()> {
    info!("Initiating client");
    let mut measurements = LiveMeasurements::subscribe(
        &config.telemetry_url,
        &config.secrets.tibber_token,
        &config.secrets.tibber_home_id,
        config.telemetry_read_timeout,
    )
    .context("Unable to subscribe to live measurements")?;

    let samples = collect_samples(&mut measurements, config.sample_count);
    measurements.close();
    let samples = samples.context("Unable to collect cost samples")?;

    let now = OffsetDateTime::now_utc().to_offset(config.quiet_hours_offset);
    let store = TriggerStore::new(&config.state_path);
    let mut speaker = SonosSpeaker::new(config.sonos.clone(), config.sonos_credentials())
        .context("Unable to create Sonos client")?;

    match Cycle::from(config).run(&samples, now, &store, &mut speaker, thread::sleep)? {
        Outcome::Suppressed(reason) => debug!("Suppressed: {:?}", reason),
        Outcome::Fired(report) if report.is_clean() => info!("Alarm finished"),
        Outcome::Fired(report) => {
            for failure in &report.skipped {
                warn!("Skipped call: {}", failure);
            }
            info!("Alarm finished with {} skipped calls", report.skipped.len());
        }
    }
    Ok(())
}
