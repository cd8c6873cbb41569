use chrono::Duration;
use tracing::{debug, warn};

use crate::config::ElectionCalendar;
use crate::constants::DEADLINE_DATE_FORMAT;

/// Resolves a jurisdiction's voter-registration deadline.
///
/// An explicit, non-empty deadline from source data always wins. Otherwise
/// the fallback is the general election date minus the configured offset,
/// which is the same for every jurisdiction and only a rough guide.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineResolver<'a> {
    calendar: &'a ElectionCalendar,
}

impl<'a> DeadlineResolver<'a> {
    pub fn new(calendar: &'a ElectionCalendar) -> Self {
        Self { calendar }
    }

    pub fn resolve(&self, code: &str, explicit: Option<&str>) -> String {
        match explicit.map(str::trim) {
            Some(deadline) if !deadline.is_empty() => deadline.to_string(),
            _ => {
                let fallback = self.fallback();
                debug!(code = %code, deadline = %fallback, "Using fallback registration deadline");
                fallback
            }
        }
    }

    /// "Month DD, YYYY", `registration_offset_days` before the general election.
    /// An offset outside the calendar's range yields the election date itself.
    pub fn fallback(&self) -> String {
        let election = self.calendar.general_election_date;
        let deadline = Duration::try_days(self.calendar.registration_offset_days)
            .and_then(|offset| election.checked_sub_signed(offset))
            .unwrap_or_else(|| {
                warn!(
                    offset_days = self.calendar.registration_offset_days,
                    "Registration offset out of range; using the election date"
                );
                election
            });
        deadline.format(DEADLINE_DATE_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_explicit_deadline_wins() {
        let calendar = ElectionCalendar::default();
        let resolver = DeadlineResolver::new(&calendar);
        assert_eq!(resolver.resolve("VA", Some("October 6, 2025")), "October 6, 2025");
    }

    #[test]
    fn test_missing_deadline_falls_back_thirty_days() {
        let calendar = ElectionCalendar::default();
        let resolver = DeadlineResolver::new(&calendar);
        assert_eq!(resolver.resolve("VA", None), "October 05, 2025");
        assert_eq!(resolver.resolve("NJ", Some("   ")), "October 05, 2025");
    }

    #[test]
    fn test_fallback_follows_configured_calendar() {
        let calendar = ElectionCalendar {
            general_election_date: NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            registration_offset_days: 15,
            special_dates: Vec::new(),
        };
        let resolver = DeadlineResolver::new(&calendar);
        assert_eq!(resolver.resolve("CA", Some("")), "October 19, 2026");
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_election_date() {
        let calendar = ElectionCalendar {
            registration_offset_days: 1_000_000_000,
            ..ElectionCalendar::default()
        };
        let resolver = DeadlineResolver::new(&calendar);
        assert_eq!(resolver.resolve("VA", None), "November 04, 2025");
    }
}
