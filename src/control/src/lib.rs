#![no_std]

extern crate alloc;

mod collector;
mod config;
mod error;
mod estimator;
mod state;

pub use collector::collect_samples;
pub use config::CoreConfig;
pub use error::{CollectError, Error};
pub use estimator::estimate;
pub use state::{BurnRate, Cost, CostSample, QuietWindow, TriggerState};

use core::fmt;
use time::{Duration, OffsetDateTime};

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SuppressReason {
    BelowThreshold { rate: BurnRate, threshold: BurnRate },
    QuietHours { hour: u8 },
    Cooldown { remaining: Duration },
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressReason::BelowThreshold { rate, threshold } => write!(
                f,
                "burn rate {:.2} an hour is not above {:.2}",
                f64::from(*rate),
                f64::from(*threshold)
            ),
            SuppressReason::QuietHours { hour } => write!(f, "hour {} is in quiet hours", hour),
            SuppressReason::Cooldown { remaining } => write!(
                f,
                "triggered recently, cooldown ends in {}s",
                remaining.whole_seconds()
            ),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Verdict {
    Fire,
    Suppress(SuppressReason),
}

impl Verdict {
    pub fn is_fire(&self) -> bool {
        matches!(self, Verdict::Fire)
    }
}

/// Decide whether the alarm should fire for the current burn rate.
///
/// Gates are checked in order (threshold, quiet hours, cooldown) and the first
/// one that fails is reported. `now.hour()` is taken in whatever offset `now`
/// carries.
pub fn decide(
    config: &CoreConfig,
    rate: BurnRate,
    now: OffsetDateTime,
    state: &TriggerState,
) -> Verdict {
    if rate <= config.threshold {
        return Verdict::Suppress(SuppressReason::BelowThreshold {
            rate,
            threshold: config.threshold,
        });
    }

    let hour = now.hour();
    if config.quiet.is_quiet(hour) {
        return Verdict::Suppress(SuppressReason::QuietHours { hour });
    }

    if let Some(last_trigger) = state.last_trigger {
        // A trigger in the future (clock skew) counts as within cooldown
        let elapsed = now - last_trigger;
        if elapsed < config.cooldown {
            return Verdict::Suppress(SuppressReason::Cooldown {
                remaining: config.cooldown - elapsed,
            });
        }
    }

    Verdict::Fire
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn settings() -> CoreConfig {
        CoreConfig {
            threshold: BurnRate::new(10.0),
            quiet: QuietWindow::new(22, 6).unwrap(),
            cooldown: Duration::minutes(30),
        }
    }

    #[test]
    fn test_decide_fires_above_threshold() {
        let now = datetime!(2024-03-01 14:00:00 UTC);
        let verdict = decide(&settings(), BurnRate::new(50.0), now, &TriggerState::default());
        assert_eq!(verdict, Verdict::Fire);
        assert!(verdict.is_fire());
    }

    #[test]
    fn test_decide_threshold_is_strict() {
        let now = datetime!(2024-03-01 14:00:00 UTC);
        let state = TriggerState::default();

        let verdict = decide(&settings(), BurnRate::new(10.0), now, &state);
        assert_eq!(
            verdict,
            Verdict::Suppress(SuppressReason::BelowThreshold {
                rate: BurnRate::new(10.0),
                threshold: BurnRate::new(10.0),
            })
        );

        let verdict = decide(&settings(), BurnRate::new(10.0 + 1e-9), now, &state);
        assert_eq!(verdict, Verdict::Fire);
    }

    #[test]
    fn test_decide_negative_rate() {
        let now = datetime!(2024-03-01 14:00:00 UTC);
        let verdict = decide(&settings(), BurnRate::new(-180.0), now, &TriggerState::default());
        assert!(!verdict.is_fire());
    }

    #[test]
    fn test_decide_quiet_hours() {
        let state = TriggerState::default();
        let rate = BurnRate::new(50.0);

        let late = decide(&settings(), rate, datetime!(2024-03-01 23:15:00 UTC), &state);
        assert_eq!(late, Verdict::Suppress(SuppressReason::QuietHours { hour: 23 }));

        let early = decide(&settings(), rate, datetime!(2024-03-01 03:00:00 UTC), &state);
        assert_eq!(early, Verdict::Suppress(SuppressReason::QuietHours { hour: 3 }));

        let midday = decide(&settings(), rate, datetime!(2024-03-01 12:00:00 UTC), &state);
        assert_eq!(midday, Verdict::Fire);

        // Both bounds are still active hours
        let evening = decide(&settings(), rate, datetime!(2024-03-01 22:59:00 UTC), &state);
        assert_eq!(evening, Verdict::Fire);
        let morning = decide(&settings(), rate, datetime!(2024-03-01 06:00:00 UTC), &state);
        assert_eq!(morning, Verdict::Fire);
    }

    #[test]
    fn test_decide_quiet_hours_use_offset_of_now() {
        let now = datetime!(2024-03-01 21:30:00 UTC).to_offset(time::macros::offset!(+2));
        let verdict = decide(&settings(), BurnRate::new(50.0), now, &TriggerState::default());
        assert_eq!(verdict, Verdict::Suppress(SuppressReason::QuietHours { hour: 23 }));
    }

    #[test]
    fn test_decide_cooldown() {
        let now = datetime!(2024-03-01 14:00:00 UTC);
        let rate = BurnRate::new(50.0);

        let recent = TriggerState::triggered_at(now - Duration::seconds(29 * 60 + 59));
        assert_eq!(
            decide(&settings(), rate, now, &recent),
            Verdict::Suppress(SuppressReason::Cooldown {
                remaining: Duration::seconds(1)
            })
        );

        let expired = TriggerState::triggered_at(now - Duration::seconds(30 * 60 + 1));
        assert_eq!(decide(&settings(), rate, now, &expired), Verdict::Fire);

        let exactly = TriggerState::triggered_at(now - Duration::minutes(30));
        assert_eq!(decide(&settings(), rate, now, &exactly), Verdict::Fire);
    }

    #[test]
    fn test_decide_cooldown_across_midnight() {
        let now = datetime!(2024-03-02 00:10:00 UTC);
        let state = TriggerState::triggered_at(datetime!(2024-03-01 23:55:00 UTC));
        let config = CoreConfig {
            quiet: QuietWindow::new(23, 0).unwrap(),
            ..settings()
        };

        let verdict = decide(&config, BurnRate::new(50.0), now, &state);
        assert_eq!(
            verdict,
            Verdict::Suppress(SuppressReason::Cooldown {
                remaining: Duration::minutes(15)
            })
        );
    }

    #[test]
    fn test_decide_cooldown_days_ago() {
        let now = datetime!(2024-03-05 14:00:00 UTC);
        // Same time of day, several days earlier
        let state = TriggerState::triggered_at(datetime!(2024-03-01 13:50:00 UTC));
        let verdict = decide(&settings(), BurnRate::new(50.0), now, &state);
        assert_eq!(verdict, Verdict::Fire);
    }

    #[test]
    fn test_decide_future_trigger_is_cooldown() {
        let now = datetime!(2024-03-01 14:00:00 UTC);
        let state = TriggerState::triggered_at(now + Duration::minutes(5));
        let verdict = decide(&settings(), BurnRate::new(50.0), now, &state);
        assert!(matches!(
            verdict,
            Verdict::Suppress(SuppressReason::Cooldown { .. })
        ));
    }

    #[test]
    fn test_decide_gate_priority() {
        // Below threshold wins over quiet hours and cooldown
        let now = datetime!(2024-03-01 23:00:00 UTC);
        let state = TriggerState::triggered_at(now);
        let verdict = decide(&settings(), BurnRate::new(1.0), now, &state);
        assert!(matches!(
            verdict,
            Verdict::Suppress(SuppressReason::BelowThreshold { .. })
        ));

        // Quiet hours win over cooldown
        let verdict = decide(&settings(), BurnRate::new(50.0), now, &state);
        assert_eq!(verdict, Verdict::Suppress(SuppressReason::QuietHours { hour: 23 }));
    }

    #[test]
    fn test_suppress_reason_display() {
        use alloc::string::ToString;

        let reason = SuppressReason::Cooldown {
            remaining: Duration::seconds(90),
        };
        assert_eq!(reason.to_string(), "triggered recently, cooldown ends in 90s");

        let reason = SuppressReason::BelowThreshold {
            rate: BurnRate::new(4.5),
            threshold: BurnRate::new(10.0),
        };
        assert_eq!(reason.to_string(), "burn rate 4.50 an hour is not above 10.00");
    }

    #[test]
    fn test_decide_is_repeatable() {
        let now = datetime!(2024-03-01 14:00:00 UTC);
        let state = TriggerState::triggered_at(now - Duration::minutes(10));
        let first = decide(&settings(), BurnRate::new(50.0), now, &state);
        let second = decide(&settings(), BurnRate::new(50.0), now, &state);
        assert_eq!(first, second);
    }
}
