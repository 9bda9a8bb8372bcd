//! Time plugin - current date and time values for templates
//!
//! Registered under `time` by the binary, so `{{time.date}}` renders today's
//! date. All values come from a `Clock` so tests can pin the instant.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Local, Utc};

use crate::error::BoxError;
use crate::kernel::KernelArguments;

use super::function::{Plugin, PluginFunction, function};

const DATE_FORMAT: &str = "%A, %d %B, %Y";
const NOW_FORMAT: &str = "%A, %B %d, %Y %I:%M %p";

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Date and time functions
#[derive(Clone)]
pub struct TimePlugin {
    clock: Arc<dyn Clock>,
}

impl Default for TimePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl TimePlugin {
    /// Time plugin backed by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn formatted(&self, description: &str, format: &'static str) -> Arc<dyn PluginFunction> {
        let clock = Arc::clone(&self.clock);
        function(description, move |_: &KernelArguments| {
            Ok(clock.now().format(format).to_string())
        })
    }
}

impl Plugin for TimePlugin {
    fn functions(&self) -> HashMap<String, Arc<dyn PluginFunction>> {
        let mut functions = HashMap::new();
        let mut add = |name: &str, func: Arc<dyn PluginFunction>| {
            functions.insert(name.to_string(), func);
        };

        add("date", self.formatted("Current date", DATE_FORMAT));
        add("today", self.formatted("Current date", DATE_FORMAT));
        add("now", self.formatted("Current date and time in the local time zone", NOW_FORMAT));
        add("time", self.formatted("Current time", "%I:%M:%S %p"));
        add("year", self.formatted("Current year", "%Y"));
        add("month", self.formatted("Current month name", "%B"));
        add("month_number", self.formatted("Current month number", "%m"));
        add("day", self.formatted("Current day of the month", "%d"));
        add("day_of_week", self.formatted("Current day of the week", "%A"));
        add("hour", self.formatted("Current clock hour", "%I %p"));
        add("hour_number", self.formatted("Current clock hour, 24-hour", "%H"));
        add("minute", self.formatted("Current clock minute", "%M"));
        add("second", self.formatted("Current clock second", "%S"));
        add("time_zone_offset", self.formatted("Current UTC offset", "%z"));
        add("time_zone_name", self.formatted("Current time zone", "%Z"));

        let clock = Arc::clone(&self.clock);
        add(
            "utc_now",
            function("Current UTC date and time", move |_: &KernelArguments| {
                Ok(clock.now().with_timezone(&Utc).format(NOW_FORMAT).to_string())
            }),
        );

        let clock = Arc::clone(&self.clock);
        add(
            "days_ago",
            function("Date a number of days before today (argument: days)", move |args: &KernelArguments| {
                let days = days_argument(args)?;
                let delta = Duration::try_days(days).ok_or("days value out of range")?;
                let date = clock.now().checked_sub_signed(delta).ok_or("days value out of range")?;
                Ok(date.format(DATE_FORMAT).to_string())
            }),
        );

        let clock = Arc::clone(&self.clock);
        add(
            "date_matching_last_day_name",
            function(
                "Date of the most recent given weekday before today (argument: day_name)",
                move |args: &KernelArguments| {
                    let day_name = args
                        .get("day_name")
                        .or_else(|| args.get("input"))
                        .ok_or("missing argument: day_name")?;
                    last_matching_day(clock.now(), day_name)
                },
            ),
        );

        functions
    }
}

fn days_argument(args: &KernelArguments) -> Result<i64, BoxError> {
    let raw = args
        .get("days")
        .or_else(|| args.get("input"))
        .ok_or("missing argument: days")?;
    raw.trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid days value '{}': {}", raw, e).into())
}

fn last_matching_day(now: DateTime<FixedOffset>, day_name: &str) -> Result<String, BoxError> {
    let wanted = day_name.trim();
    (1..=7)
        .map(|back| now - Duration::days(back))
        .find(|date| date.format("%A").to_string().eq_ignore_ascii_case(wanted))
        .map(|date| date.format(DATE_FORMAT).to_string())
        .ok_or_else(|| format!("'{}' is not a day of the week", day_name).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Sunday, 12 January 2031, 14:05:09 at UTC+02:00
    fn fixed_plugin() -> TimePlugin {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let instant = offset.with_ymd_and_hms(2031, 1, 12, 14, 5, 9).unwrap();
        TimePlugin::with_clock(Arc::new(FixedClock(instant)))
    }

    async fn call(name: &str, args: &KernelArguments) -> Result<String, BoxError> {
        let functions = fixed_plugin().functions();
        functions[name].invoke(args).await
    }

    async fn call_plain(name: &str) -> String {
        call(name, &KernelArguments::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_date_functions() {
        assert_eq!(call_plain("date").await, "Sunday, 12 January, 2031");
        assert_eq!(call_plain("today").await, "Sunday, 12 January, 2031");
        assert_eq!(call_plain("year").await, "2031");
        assert_eq!(call_plain("month").await, "January");
        assert_eq!(call_plain("month_number").await, "01");
        assert_eq!(call_plain("day").await, "12");
        assert_eq!(call_plain("day_of_week").await, "Sunday");
    }

    #[tokio::test]
    async fn test_time_functions() {
        assert_eq!(call_plain("time").await, "02:05:09 PM");
        assert_eq!(call_plain("hour").await, "02 PM");
        assert_eq!(call_plain("hour_number").await, "14");
        assert_eq!(call_plain("minute").await, "05");
        assert_eq!(call_plain("second").await, "09");
        assert_eq!(call_plain("time_zone_offset").await, "+0200");
    }

    #[tokio::test]
    async fn test_now_and_utc_now() {
        assert_eq!(call_plain("now").await, "Sunday, January 12, 2031 02:05 PM");
        assert_eq!(call_plain("utc_now").await, "Sunday, January 12, 2031 12:05 PM");
    }

    #[tokio::test]
    async fn test_days_ago() {
        let mut args = KernelArguments::new();
        args.insert("days", "3");
        assert_eq!(call("days_ago", &args).await.unwrap(), "Thursday, 09 January, 2031");
    }

    #[tokio::test]
    async fn test_days_ago_invalid_and_missing() {
        let mut args = KernelArguments::new();
        args.insert("days", "three");
        let err = call("days_ago", &args).await.unwrap_err();
        assert!(err.to_string().contains("invalid days value"));

        let err = call("days_ago", &KernelArguments::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "missing argument: days");
    }

    #[tokio::test]
    async fn test_date_matching_last_day_name() {
        let mut args = KernelArguments::new();
        args.insert("day_name", "friday");
        assert_eq!(
            call("date_matching_last_day_name", &args).await.unwrap(),
            "Friday, 10 January, 2031"
        );

        // Today is Sunday; the previous Sunday is a week back
        args.insert("day_name", "Sunday");
        assert_eq!(
            call("date_matching_last_day_name", &args).await.unwrap(),
            "Sunday, 05 January, 2031"
        );
    }

    #[tokio::test]
    async fn test_date_matching_unknown_day() {
        let mut args = KernelArguments::new();
        args.insert("day_name", "Caturday");
        let err = call("date_matching_last_day_name", &args).await.unwrap_err();
        assert!(err.to_string().contains("not a day of the week"));
    }

    #[test]
    fn test_function_set() {
        let functions = TimePlugin::new().functions();
        assert_eq!(functions.len(), 18);
        assert!(functions.contains_key("date"));
        assert!(functions.contains_key("time"));
    }
}
