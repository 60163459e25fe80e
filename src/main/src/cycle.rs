use anyhow::{Context, Result};
use log::*;
use std::time::Duration;
use time::OffsetDateTime;

use control::{
    decide, estimate, BurnRate, CoreConfig, CostSample, SuppressReason, TriggerState, Verdict,
};

use crate::config::Config;
use crate::playback::{self, ActionPlan, PlaybackReport};
use crate::speaker::Speaker;
use crate::trigger_state::TriggerStore;

#[derive(Debug)]
pub enum Outcome {
    Suppressed(SuppressReason),
    Fired(PlaybackReport),
}

/// One evaluation: estimate, decide and, when firing, play the alarm.
pub struct Cycle {
    pub sample_interval: time::Duration,
    pub threshold: BurnRate,
    pub cooldown: time::Duration,
    pub plan: ActionPlan,
}

impl From<&Config> for Cycle {
    fn from(config: &Config) -> Cycle {
        Cycle {
            sample_interval: config.sample_interval,
            threshold: BurnRate::new(config.secrets.hourly_trigger_rate),
            cooldown: config.cooldown,
            plan: config.plan.clone(),
        }
    }
}

impl Cycle {
    pub fn run<S: Speaker>(
        &self,
        samples: &[CostSample],
        now: OffsetDateTime,
        store: &TriggerStore,
        speaker: &mut S,
        wait: impl FnOnce(Duration),
    ) -> Result<Outcome> {
        let rate = estimate(samples, self.sample_interval)?;
        if let [first, .., last] = samples {
            info!(
                "Accumulated cost went from {} to {}",
                f64::from(first.accumulated_cost),
                f64::from(last.accumulated_cost)
            );
        }
        info!(
            "Current burn rate: {:.2} an hour, trigger rate {:.2}",
            f64::from(rate),
            f64::from(self.threshold)
        );

        let stored = store
            .load()
            .with_context(|| format!("Unable to load {}", store.path().display()))?;
        let core = CoreConfig {
            threshold: self.threshold,
            quiet: stored.quiet,
            cooldown: self.cooldown,
        };

        match decide(&core, rate, now, &stored.trigger) {
            Verdict::Suppress(reason) => {
                info!("Not playing: {}. Exiting", reason);
                Ok(Outcome::Suppressed(reason))
            }
            Verdict::Fire => {
                info!(
                    "Currently burning more than {:.2} an hour",
                    f64::from(self.threshold)
                );

                // Committed before any call so a failed run still starts the cooldown
                store
                    .save(&TriggerState::triggered_at(now))
                    .context("Unable to record trigger, not playing")?;

                let report = playback::perform(speaker, &self.plan, wait)
                    .context("Alarm playback failed")?;
                Ok(Outcome::Fired(report))
            }
        }
    }
}
