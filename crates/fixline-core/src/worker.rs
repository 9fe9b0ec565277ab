//! Worker profiles, snapshots, and weekly availability.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::ids::WorkerId;
use crate::job::JobCategory;

/// One window in a worker's weekly schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Day of week the window applies to.
    pub weekday: Weekday,
    /// First hour (inclusive, 0-23).
    pub start_hour: u32,
    /// Last hour (exclusive, 1-24).
    pub end_hour: u32,
}

impl AvailabilityWindow {
    /// Creates a window for one weekday.
    #[must_use]
    pub const fn new(weekday: Weekday, start_hour: u32, end_hour: u32) -> Self {
        Self {
            weekday,
            start_hour,
            end_hour,
        }
    }

    /// Returns true if the window covers the given instant.
    #[must_use]
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        at.weekday() == self.weekday && (self.start_hour..self.end_hour).contains(&at.hour())
    }

    /// The same hour range on every day of the week.
    #[must_use]
    pub fn full_week(start_hour: u32, end_hour: u32) -> Vec<Self> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(|weekday| Self::new(weekday, start_hour, end_hour))
        .collect()
    }
}

/// A worker ("master") as registered with the Worker Registry.
///
/// The registry owns the profile; everything else in the engine sees
/// read-only [`WorkerSnapshot`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerProfile {
    /// Unique identifier.
    pub id: WorkerId,
    /// Display name.
    pub full_name: String,
    /// Categories the worker serves.
    pub specializations: Vec<JobCategory>,
    /// Home base the service radius is measured from.
    pub location: GeoPoint,
    /// How far from home base the worker takes jobs, in kilometers.
    pub service_radius_km: f64,
    /// Tool tags the worker carries.
    pub tools: Vec<String>,
    /// Rating in [0, 5].
    pub rating: f64,
    /// Maximum concurrent open jobs per day.
    pub daily_capacity: u32,
    /// Weekly schedule; a worker with no windows is never offered work.
    pub availability: Vec<AvailabilityWindow>,
    /// Registration time, used as the final matching tie-break.
    pub registered_at: DateTime<Utc>,
}

impl WorkerProfile {
    /// Returns true if the worker serves the given category.
    #[must_use]
    pub fn has_specialization(&self, category: JobCategory) -> bool {
        self.specializations.contains(&category)
    }

    /// Returns true if any availability window covers the given instant.
    #[must_use]
    pub fn available_at(&self, at: DateTime<Utc>) -> bool {
        self.availability.iter().any(|w| w.covers(at))
    }

    /// Returns true if the worker carries every required tool tag.
    #[must_use]
    pub fn has_tools(&self, required: &[String]) -> bool {
        required.iter().all(|t| self.tools.contains(t))
    }
}

/// A point-in-time view of a worker handed to the Matcher.
///
/// Snapshots are plain data: the Matcher scores them and asks the registry
/// for a reservation, it never mutates worker state itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    /// Unique identifier.
    pub id: WorkerId,
    /// Home base location.
    pub location: GeoPoint,
    /// Tool tags the worker carries.
    pub tools: Vec<String>,
    /// Rating in [0, 5].
    pub rating: f64,
    /// Open jobs at snapshot time.
    pub open_jobs: u32,
    /// Maximum concurrent open jobs.
    pub daily_capacity: u32,
    /// Registration time, used as the final matching tie-break.
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile() -> WorkerProfile {
        WorkerProfile {
            id: WorkerId::new("w-1"),
            full_name: "Ivan Petrov".to_string(),
            specializations: vec![JobCategory::Electrical],
            location: GeoPoint::new(55.75, 37.61),
            service_radius_km: 20.0,
            tools: vec!["multimeter".to_string(), "drill".to_string()],
            rating: 4.6,
            daily_capacity: 5,
            availability: AvailabilityWindow::full_week(8, 20),
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn window_covers_hours() {
        // 2026-08-03 is a Monday
        let monday_noon = Utc.with_ymd_and_hms(2026, 8, 3, 12, 0, 0).unwrap();
        let monday_night = Utc.with_ymd_and_hms(2026, 8, 3, 22, 0, 0).unwrap();
        let w = AvailabilityWindow::new(Weekday::Mon, 8, 20);
        assert!(w.covers(monday_noon));
        assert!(!w.covers(monday_night));
    }

    #[test]
    fn window_end_hour_is_exclusive() {
        let monday_eight_pm = Utc.with_ymd_and_hms(2026, 8, 3, 20, 0, 0).unwrap();
        let w = AvailabilityWindow::new(Weekday::Mon, 8, 20);
        assert!(!w.covers(monday_eight_pm));
    }

    #[test]
    fn empty_schedule_is_never_available() {
        let mut p = profile();
        p.availability.clear();
        assert!(!p.available_at(Utc::now()));
    }

    #[test]
    fn specialization_and_tools_checks() {
        let p = profile();
        assert!(p.has_specialization(JobCategory::Electrical));
        assert!(!p.has_specialization(JobCategory::Plumbing));
        assert!(p.has_tools(&["multimeter".to_string()]));
        assert!(!p.has_tools(&["pipe_wrench".to_string()]));
        assert!(p.has_tools(&[]));
    }
}
