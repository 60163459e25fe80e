use time::Duration;

use crate::state::{BurnRate, CostSample};
use crate::Error;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Estimate the hourly spend from the first and last of a window of samples.
///
/// Samples are assumed to arrive exactly `interval` apart; their own
/// timestamps are ignored.
pub fn estimate(samples: &[CostSample], interval: Duration) -> Result<BurnRate, Error> {
    let (first, last) = match samples {
        [first, .., last] => (first, last),
        _ => {
            return Err(Error::InsufficientSamples {
                found: samples.len(),
            })
        }
    };

    let cost_difference = f64::from(last.accumulated_cost) - f64::from(first.accumulated_cost);

    //                    cost_difference        3600
    // rate  =  ------------------------------ * --------
    //           number of intervals covered      interval
    let intervals_per_hour = SECONDS_PER_HOUR / interval.as_seconds_f64();
    let intervals = (samples.len() - 1) as f64;

    Ok(BurnRate::new(cost_difference * intervals_per_hour / intervals))
}
