use alloc::vec::Vec;

use crate::error::CollectError;
use crate::state::CostSample;

/// Take the next `count` samples from a telemetry source, in arrival order.
///
/// The source is only advanced `count` times, so a live subscription is left
/// open for the caller to close.
pub fn collect_samples<I, E>(source: I, count: usize) -> Result<Vec<CostSample>, CollectError<E>>
where
    I: IntoIterator<Item = Result<CostSample, E>>,
{
    let mut samples = Vec::with_capacity(count);

    for event in source.into_iter().take(count) {
        samples.push(event.map_err(CollectError::Stream)?);
    }

    if samples.len() < count {
        return Err(CollectError::StreamExhausted {
            expected: count,
            received: samples.len(),
        });
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Cost;
    use time::macros::datetime;

    fn sample(cost: f64) -> CostSample {
        CostSample::new(datetime!(2024-03-01 14:00:00 UTC), Cost::new(cost))
    }

    #[test]
    fn test_collect_takes_only_requested_samples() {
        let mut source = [Ok::<_, &str>(sample(1.0)), Ok(sample(1.5)), Ok(sample(2.0))].into_iter();

        let samples = collect_samples(source.by_ref(), 2).unwrap();

        assert_eq!(samples.as_slice(), &[sample(1.0), sample(1.5)]);
        // The third event stays in the stream
        assert_eq!(source.next(), Some(Ok(sample(2.0))));
    }

    #[test]
    fn test_collect_stream_exhausted() {
        let source = [Ok::<_, &str>(sample(1.0))];

        let result = collect_samples(source, 2);

        assert_eq!(
            result,
            Err(CollectError::StreamExhausted {
                expected: 2,
                received: 1
            })
        );
    }

    #[test]
    fn test_collect_stream_error() {
        let source = [Ok(sample(1.0)), Err("connection reset"), Ok(sample(2.0))];

        let result = collect_samples(source, 3);

        assert_eq!(result, Err(CollectError::Stream("connection reset")));
    }
}
