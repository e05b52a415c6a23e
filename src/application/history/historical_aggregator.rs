use crate::domain::usage::{
    DEFAULT_OCCUPANCY_CURVE, HistoricalPattern, HistoricalRecord, HourlyAggregate,
};
use statrs::statistics::{Data, Distribution};
use tracing::{debug, warn};

const HOURS: usize = 24;

/// Reduces a raw availability log to a gap-free 24-hour usage curve.
///
/// Hours without observations take the previous populated hour's mean
/// (forward fill); hours before the first populated one take the next
/// populated hour's mean (backward fill). With no usable records at all the
/// fallback curve is scaled to the station's capacity.
#[derive(Debug, Clone)]
pub struct HistoricalAggregator {
    fallback_curve: [f64; HOURS],
}

impl HistoricalAggregator {
    pub fn new(fallback_curve: [f64; HOURS]) -> Self {
        Self { fallback_curve }
    }

    /// 24 aggregates in hour order 0..=23.
    pub fn aggregate(&self, records: &[HistoricalRecord], capacity: u32) -> Vec<HourlyAggregate> {
        self.aggregate_filtered(records, capacity, None).0
    }

    /// Same as [`aggregate`](Self::aggregate), restricted to one ISO weekday (Monday = 0).
    pub fn aggregate_for_weekday(
        &self,
        records: &[HistoricalRecord],
        capacity: u32,
        weekday: u8,
    ) -> Vec<HourlyAggregate> {
        self.aggregate_filtered(records, capacity, Some(weekday)).0
    }

    /// Full pattern for a station, flagging whether the fallback curve was used.
    pub fn pattern(
        &self,
        station_id: u32,
        records: &[HistoricalRecord],
        capacity: u32,
        weekday: Option<u8>,
    ) -> HistoricalPattern {
        let (hours, is_fallback) = self.aggregate_filtered(records, capacity, weekday);
        HistoricalPattern {
            station_id,
            capacity,
            hours,
            is_fallback,
        }
    }

    fn aggregate_filtered(
        &self,
        records: &[HistoricalRecord],
        capacity: u32,
        weekday: Option<u8>,
    ) -> (Vec<HourlyAggregate>, bool) {
        let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); HOURS];

        for record in records {
            if weekday.is_some_and(|d| d != record.day_of_week) {
                continue;
            }
            match buckets.get_mut(record.hour_of_day as usize) {
                Some(bucket) => bucket.push(record.bikes_available as f64),
                None => warn!(
                    "HistoricalAggregator: skipping record for station {} with hour_of_day {}",
                    record.station_id, record.hour_of_day
                ),
            }
        }

        let mut means: Vec<Option<f64>> = buckets
            .into_iter()
            .map(|values| {
                if values.is_empty() {
                    None
                } else {
                    Data::new(values).mean()
                }
            })
            .collect();

        if means.iter().all(Option::is_none) {
            debug!("HistoricalAggregator: no usable records, using fallback curve");
            let hours = self
                .fallback_curve
                .iter()
                .enumerate()
                .map(|(h, share)| HourlyAggregate::new(h as u8, share * capacity as f64, capacity))
                .collect();
            return (hours, true);
        }

        fill_gaps(&mut means);

        let hours = means
            .into_iter()
            .enumerate()
            .filter_map(|(h, mean)| mean.map(|m| HourlyAggregate::new(h as u8, m, capacity)))
            .collect();
        (hours, false)
    }
}

impl Default for HistoricalAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_OCCUPANCY_CURVE)
    }
}

/// Forward fill, then backward fill for leading gaps.
fn fill_gaps(means: &mut [Option<f64>]) {
    let mut last = None;
    for slot in means.iter_mut() {
        match slot {
            Some(v) => last = Some(*v),
            None => *slot = last,
        }
    }

    let mut next = None;
    for slot in means.iter_mut().rev() {
        match slot {
            Some(v) => next = Some(*v),
            None => *slot = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(hour: u8, bikes: u32) -> HistoricalRecord {
        HistoricalRecord::new(1, hour, 0, bikes)
    }

    #[test]
    fn test_mean_per_hour() {
        let records = vec![rec(8, 4), rec(8, 6), rec(8, 11), rec(9, 3)];
        let hours = HistoricalAggregator::default().aggregate(&records, 20);

        assert_eq!(hours.len(), 24);
        assert_eq!(hours[8].mean_bikes_available, 7.0);
        assert_eq!(hours[9].mean_bikes_available, 3.0);
    }

    #[test]
    fn test_gap_fill() {
        let records = vec![rec(6, 2), rec(6, 4), rec(12, 10), rec(18, 15)];
        let hours = HistoricalAggregator::default().aggregate(&records, 20);

        for h in 0..=6 {
            assert_eq!(hours[h].mean_bikes_available, 3.0, "hour {}", h);
        }
        for h in 7..=11 {
            assert_eq!(hours[h].mean_bikes_available, 3.0, "hour {}", h);
        }
        for h in 12..=17 {
            assert_eq!(hours[h].mean_bikes_available, 10.0, "hour {}", h);
        }
        for h in 18..=23 {
            assert_eq!(hours[h].mean_bikes_available, 15.0, "hour {}", h);
        }
    }

    #[test]
    fn test_hour_order() {
        let hours = HistoricalAggregator::default().aggregate(&[rec(23, 1)], 10);
        let order: Vec<u8> = hours.iter().map(|h| h.hour_of_day).collect();
        assert_eq!(order, (0..24).collect::<Vec<u8>>());
        // single populated hour backward-fills the whole day
        assert!(hours.iter().all(|h| h.mean_bikes_available == 1.0));
    }

    #[test]
    fn test_stands_complement_bikes() {
        let records = vec![rec(0, 30), rec(5, 7), rec(10, 0)];
        for capacity in [0u32, 1, 12, 25] {
            let hours = HistoricalAggregator::default().aggregate(&records, capacity);
            for h in &hours {
                assert!(h.available_stands >= 0.0);
                assert!(
                    (h.available_bikes + h.available_stands - capacity as f64).abs() < 1e-9
                );
            }
        }
    }

    #[test]
    fn test_empty_uses_fallback() {
        let aggregator = HistoricalAggregator::default();
        let pattern = aggregator.pattern(3, &[], 20, None);

        assert!(pattern.is_fallback);
        assert_eq!(pattern.hours.len(), 24);
        for (h, agg) in pattern.hours.iter().enumerate() {
            assert_eq!(agg.mean_bikes_available, DEFAULT_OCCUPANCY_CURVE[h] * 20.0);
        }
    }

    #[test]
    fn test_invalid_hours_ignored() {
        let records = vec![rec(24, 5), rec(99, 5)];
        let pattern = HistoricalAggregator::default().pattern(1, &records, 10, None);
        assert!(pattern.is_fallback);
    }

    #[test]
    fn test_weekday_filter() {
        let records = vec![
            HistoricalRecord::new(1, 9, 0, 2),
            HistoricalRecord::new(1, 9, 5, 12),
        ];
        let aggregator = HistoricalAggregator::default();
        let monday = aggregator.aggregate_for_weekday(&records, 20, 0);
        let saturday = aggregator.aggregate_for_weekday(&records, 20, 5);
        assert_eq!(monday[9].mean_bikes_available, 2.0);
        assert_eq!(saturday[9].mean_bikes_available, 12.0);

        let sunday = aggregator.pattern(1, &records, 20, Some(6));
        assert!(sunday.is_fallback);
    }
}
