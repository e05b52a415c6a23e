use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Typical share of capacity holding a bike, per hour of day.
///
/// Used when a station has no history at all. Shape follows a commuter
/// station: full overnight, drained through the morning peak, refilling
/// after the evening peak.
pub const DEFAULT_OCCUPANCY_CURVE: [f64; 24] = [
    0.70, 0.72, 0.73, 0.74, 0.74, 0.72, // 00-05
    0.65, 0.50, 0.35, 0.30, 0.32, 0.35, // 06-11
    0.38, 0.40, 0.40, 0.38, 0.35, 0.30, // 12-17
    0.32, 0.40, 0.50, 0.58, 0.63, 0.67, // 18-23
];

/// One observed availability sample for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub station_id: u32,
    pub hour_of_day: u8,
    /// ISO weekday, Monday = 0
    pub day_of_week: u8,
    pub bikes_available: u32,
}

impl HistoricalRecord {
    pub fn new(station_id: u32, hour_of_day: u8, day_of_week: u8, bikes_available: u32) -> Self {
        Self {
            station_id,
            hour_of_day,
            day_of_week,
            bikes_available,
        }
    }

    /// Bucket an observation by its local hour and weekday in `tz`.
    pub fn from_observation(
        station_id: u32,
        observed_at: DateTime<Utc>,
        bikes_available: u32,
        tz: Tz,
    ) -> Self {
        let local = observed_at.with_timezone(&tz);
        Self {
            station_id,
            hour_of_day: local.hour() as u8,
            day_of_week: local.weekday().num_days_from_monday() as u8,
            bikes_available,
        }
    }
}

/// Mean usage for one hour-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyAggregate {
    pub hour_of_day: u8,
    pub mean_bikes_available: f64,
    /// `mean_bikes_available` clamped into `[0, capacity]`
    pub available_bikes: f64,
    /// `capacity - available_bikes`
    pub available_stands: f64,
}

impl HourlyAggregate {
    pub fn new(hour_of_day: u8, mean_bikes_available: f64, capacity: u32) -> Self {
        let capacity = capacity as f64;
        let available_bikes = mean_bikes_available.clamp(0.0, capacity);
        Self {
            hour_of_day,
            mean_bikes_available,
            available_bikes,
            available_stands: capacity - available_bikes,
        }
    }

    /// "HH:00" label used on chart axes.
    pub fn label(&self) -> String {
        format!("{:02}:00", self.hour_of_day)
    }
}

/// Which hours of a pattern to return for compact charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourSelection {
    pub start: u8,
    pub end: u8,
    pub step: u8,
}

impl HourSelection {
    pub const ALL: HourSelection = HourSelection {
        start: 0,
        end: 23,
        step: 1,
    };

    pub fn includes(&self, hour: u8) -> bool {
        let step = self.step.max(1);
        hour >= self.start && hour <= self.end && (hour - self.start) % step == 0
    }
}

impl Default for HourSelection {
    /// Every third hour from 05:00 to 23:00.
    fn default() -> Self {
        Self {
            start: 5,
            end: 23,
            step: 3,
        }
    }
}

/// A full 24-hour usage curve for one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPattern {
    pub station_id: u32,
    pub capacity: u32,
    /// Exactly 24 entries, hour 0..=23
    pub hours: Vec<HourlyAggregate>,
    /// Built from `DEFAULT_OCCUPANCY_CURVE` because no history existed
    pub is_fallback: bool,
}

impl HistoricalPattern {
    /// Select a subset of hours. The underlying aggregate is untouched.
    pub fn downsample(&self, selection: HourSelection) -> Vec<&HourlyAggregate> {
        self.hours
            .iter()
            .filter(|h| selection.includes(h.hour_of_day))
            .collect()
    }

    pub fn chart_points(&self, selection: HourSelection) -> Vec<ChartPoint> {
        self.downsample(selection)
            .into_iter()
            .map(ChartPoint::from)
            .collect()
    }
}

/// JSON shape consumed by the usage charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: String,
    pub available_bikes: f64,
    pub available_stands: f64,
}

impl From<&HourlyAggregate> for ChartPoint {
    fn from(h: &HourlyAggregate) -> Self {
        Self {
            timestamp: h.label(),
            available_bikes: h.available_bikes,
            available_stands: h.available_stands,
        }
    }
}
