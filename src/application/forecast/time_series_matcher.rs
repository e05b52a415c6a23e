use crate::domain::errors::MatchError;
use crate::domain::forecast::ForecastSample;
use chrono::{DateTime, Utc};

/// Nearest forecast sample to `target` by linear scan.
///
/// Spacing is not assumed uniform and the input need not be sorted. On an
/// exact tie the earliest-indexed sample wins: the scan only replaces the
/// current best on a strictly smaller distance.
pub fn closest(
    target: DateTime<Utc>,
    samples: &[ForecastSample],
) -> Result<&ForecastSample, MatchError> {
    let mut best: Option<(&ForecastSample, i64)> = None;

    for sample in samples {
        let distance = sample.distance_ms(target);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((sample, distance)),
        }
    }

    best.map(|(sample, _)| sample).ok_or(MatchError::NotFound)
}

/// Binary-search variant of [`closest`] for long, ascending sequences.
///
/// Returns exactly the sample `closest` would, including the tie-break.
pub fn closest_sorted(
    target: DateTime<Utc>,
    samples: &[ForecastSample],
) -> Result<&ForecastSample, MatchError> {
    if samples.is_empty() {
        return Err(MatchError::NotFound);
    }

    // First sample at or after target
    let after = samples.partition_point(|s| s.timestamp < target);

    let before = after.checked_sub(1).map(|idx| {
        // Walk back to the first sample sharing this timestamp
        let ts = samples[idx].timestamp;
        samples.partition_point(|s| s.timestamp < ts)
    });

    let pick = match (before, samples.get(after)) {
        (Some(b), Some(a)) => {
            if samples[b].distance_ms(target) <= a.distance_ms(target) {
                b
            } else {
                after
            }
        }
        (Some(b), None) => b,
        (None, Some(_)) => after,
        (None, None) => return Err(MatchError::NotFound),
    };

    Ok(&samples[pick])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, hour, 0, 0).unwrap()
    }

    fn sample(ts: DateTime<Utc>, temperature: f64) -> ForecastSample {
        ForecastSample::new(ts, temperature, 70.0, 1010.0)
    }

    fn three_hourly() -> Vec<ForecastSample> {
        (0..8).map(|i| sample(at(i * 3), i as f64)).collect()
    }

    #[test]
    fn test_empty_is_not_found() {
        assert_eq!(closest(at(3), &[]), Err(MatchError::NotFound));
        assert_eq!(closest_sorted(at(3), &[]), Err(MatchError::NotFound));
    }

    #[test]
    fn test_exact_match() {
        let samples = three_hourly();
        assert_eq!(closest(at(9), &samples).unwrap().temperature, 3.0);
    }

    #[test]
    fn test_nearest_between_samples() {
        let samples = three_hourly();
        // 10:00 is 1h from 09:00 and 2h from 12:00
        assert_eq!(closest(at(10), &samples).unwrap().timestamp, at(9));
        // 11:00 is nearer 12:00
        assert_eq!(closest(at(11), &samples).unwrap().timestamp, at(12));
    }

    #[test]
    fn test_tie_prefers_earliest_index() {
        let samples = vec![sample(at(9), 1.0), sample(at(11), 2.0)];
        // 10:00 is exactly 1h from both
        assert_eq!(closest(at(10), &samples).unwrap().temperature, 1.0);
        assert_eq!(closest_sorted(at(10), &samples).unwrap().temperature, 1.0);
    }

    #[test]
    fn test_tie_on_duplicate_timestamps() {
        let samples = vec![sample(at(6), 1.0), sample(at(6), 2.0), sample(at(12), 3.0)];
        assert_eq!(closest(at(7), &samples).unwrap().temperature, 1.0);
        assert_eq!(closest_sorted(at(7), &samples).unwrap().temperature, 1.0);
    }

    #[test]
    fn test_target_outside_horizon() {
        let samples = three_hourly();
        let before = at(0) - Duration::days(1);
        let after = at(21) + Duration::days(3);
        assert_eq!(closest(before, &samples).unwrap().timestamp, at(0));
        assert_eq!(closest(after, &samples).unwrap().timestamp, at(21));
        assert_eq!(closest_sorted(before, &samples).unwrap().timestamp, at(0));
        assert_eq!(closest_sorted(after, &samples).unwrap().timestamp, at(21));
    }

    #[test]
    fn test_irregular_spacing() {
        let samples = vec![sample(at(1), 1.0), sample(at(2), 2.0), sample(at(20), 3.0)];
        assert_eq!(closest(at(10), &samples).unwrap().temperature, 2.0);
        assert_eq!(closest(at(12), &samples).unwrap().temperature, 3.0);
    }

    #[test]
    fn test_unsorted_input_linear_scan() {
        let samples = vec![sample(at(18), 1.0), sample(at(3), 2.0), sample(at(9), 3.0)];
        assert_eq!(closest(at(8), &samples).unwrap().temperature, 3.0);
    }

    #[test]
    fn test_sorted_variant_agrees_with_scan() {
        let samples = vec![
            sample(at(0), 0.0),
            sample(at(2), 1.0),
            sample(at(2), 2.0),
            sample(at(7), 3.0),
            sample(at(13), 4.0),
            sample(at(14), 5.0),
        ];
        for minutes in (0..(24 * 60)).step_by(15) {
            let target = at(0) + Duration::minutes(minutes);
            assert_eq!(
                closest(target, &samples).unwrap(),
                closest_sorted(target, &samples).unwrap(),
                "mismatch at {}",
                target
            );
        }
    }
}
