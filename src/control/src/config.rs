use time::Duration;

use crate::state::{BurnRate, QuietWindow};

#[derive(Copy, Clone, Debug)]
pub struct CoreConfig {
    // Burn rate the estimate must exceed before the alarm fires
    pub threshold: BurnRate,

    // Hours of the day in which the alarm never fires
    pub quiet: QuietWindow,

    // Minimum time between two alarms
    pub cooldown: Duration,
}
