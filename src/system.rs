use std::fmt;
use std::io;
use std::time::Duration;

use chrono::{DateTime, Datelike, Timelike};
use systemstat::{Platform, System};

const UNITS: [&str; 4] = ["day", "hour", "minute", "second"];
const PLURAL_SUFFIX: &str = "s";
const NOT_A_NUMBER: &str = "NaN";

/// Seconds since the Unix epoch at which the host booted.
///
/// Text that doesn't start with an integer yields an invalid instant, which
/// renders as `NaN` fields instead of failing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BootInstant(Option<i64>);

impl BootInstant {
    pub fn from_seconds(seconds: i64) -> Self {
        BootInstant(Some(seconds))
    }

    /// Parses the leading integer of `text`, ignoring whatever follows it.
    ///
    /// Leading whitespace and a sign are skipped, and a `0x` prefix reads the
    /// digits as hexadecimal.
    pub fn parse(text: &str) -> Self {
        BootInstant(parse_leading_int(text))
    }

    /// Boot instant implied by the host's uptime at `now_millis`.
    pub fn from_system(system: &System, now_millis: i64) -> io::Result<Self> {
        Ok(Self::from_uptime(system.uptime()?, now_millis))
    }

    /// Boot instant `uptime` before `now_millis`, saturating at `i64::MIN`.
    pub fn from_uptime(uptime: Duration, now_millis: i64) -> Self {
        let uptime_seconds = i64::try_from(uptime.as_secs()).unwrap_or(i64::MAX);
        Self::from_seconds(now_millis.div_euclid(1000).saturating_sub(uptime_seconds))
    }

    pub fn seconds(&self) -> Option<i64> {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }
}

fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or_else(|| digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = i64::from_str_radix(&digits[..end], radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Calendar-style breakdown of the time since boot.
///
/// `days` is the day of the month of the elapsed milliseconds read as a UTC
/// instant, minus one. It therefore wraps back to zero after a month.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Elapsed {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Elapsed {
    fn since(boot_seconds: i64, now_millis: i64) -> Option<Self> {
        let delta = now_millis.checked_sub(boot_seconds.checked_mul(1000)?)?;
        let at = DateTime::from_timestamp_millis(delta)?;

        Some(Elapsed {
            days: at.day() - 1,
            hours: at.hour(),
            minutes: at.minute(),
            seconds: at.second(),
        })
    }

    fn values(&self) -> [u32; 4] {
        [self.days, self.hours, self.minutes, self.seconds]
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let fragments = self
            .values()
            .iter()
            .zip(UNITS.iter())
            .map(|(value, unit)| {
                if *value > 1 {
                    format!("{} {}{}", value, unit, PLURAL_SUFFIX)
                } else {
                    format!("{} {}", value, unit)
                }
            })
            .collect::<Vec<_>>();

        f.write_str(&fragments.join(" "))
    }
}

/// Time since boot as shown to the user, or `None` when it can't be computed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Uptime(Option<Elapsed>);

impl Uptime {
    pub fn compute(boot: BootInstant, now_millis: i64) -> Self {
        Uptime(
            boot.seconds()
                .and_then(|seconds| Elapsed::since(seconds, now_millis)),
        )
    }

}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self.0 {
            Some(elapsed) => fmt::Display::fmt(&elapsed, f),
            None => {
                let fragments = UNITS
                    .iter()
                    .map(|unit| format!("{} {}", NOT_A_NUMBER, unit))
                    .collect::<Vec<_>>();

                f.write_str(&fragments.join(" "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: i64 = 1000;
    const MINUTE: i64 = 60 * SECOND;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    // 2019-01-21T00:00:00Z
    const BOOT: i64 = 1_548_028_800;

    impl Elapsed {
        fn new(days: u32, hours: u32, minutes: u32, seconds: u32) -> Self {
            Elapsed {
                days,
                hours,
                minutes,
                seconds,
            }
        }
    }

    impl Uptime {
        fn elapsed(&self) -> Option<Elapsed> {
            self.0
        }
    }

    fn uptime_after(millis: i64) -> Uptime {
        Uptime::compute(BootInstant::from_seconds(BOOT), BOOT * 1000 + millis)
    }

    #[test]
    fn test_uptime_hour_minute_second() {
        let uptime = uptime_after(3_661_000);
        assert_eq!(uptime.elapsed(), Some(Elapsed::new(0, 1, 1, 1)));
        assert_eq!(uptime.to_string(), "0 day 1 hour 1 minute 1 second");
    }

    #[test]
    fn test_uptime_pluralizes_each_field() {
        let uptime = uptime_after(2 * DAY + 5 * MINUTE);
        assert_eq!(uptime.elapsed(), Some(Elapsed::new(2, 0, 5, 0)));
        assert_eq!(uptime.to_string(), "2 days 0 hour 5 minutes 0 second");
    }

    #[test]
    fn test_uptime_all_singular() {
        let uptime = uptime_after(DAY + HOUR + MINUTE + SECOND);
        assert_eq!(uptime.elapsed(), Some(Elapsed::new(1, 1, 1, 1)));
        assert_eq!(uptime.to_string(), "1 day 1 hour 1 minute 1 second");
    }

    #[test]
    fn test_uptime_all_plural() {
        let uptime = uptime_after(3 * DAY + 4 * HOUR + 12 * MINUTE + 5 * SECOND);
        assert_eq!(uptime.to_string(), "3 days 4 hours 12 minutes 5 seconds");
    }

    #[test]
    fn test_plural_boundary() {
        assert_eq!(
            Elapsed::new(2, 2, 2, 2).to_string(),
            "2 days 2 hours 2 minutes 2 seconds"
        );
        assert_eq!(
            Elapsed::new(0, 1, 0, 1).to_string(),
            "0 day 1 hour 0 minute 1 second"
        );
    }

    #[test]
    fn test_uptime_at_boot() {
        assert_eq!(uptime_after(0).to_string(), "0 day 0 hour 0 minute 0 second");
    }

    #[test]
    fn test_uptime_ignores_sub_second_millis() {
        assert_eq!(uptime_after(1999).elapsed(), Some(Elapsed::new(0, 0, 0, 1)));
    }

    #[test]
    fn test_uptime_days_wrap_after_a_month() {
        // The day count comes from the calendar day of the elapsed instant,
        // so 31 days lands on 1 February and reads as zero.
        assert_eq!(uptime_after(30 * DAY).elapsed(), Some(Elapsed::new(30, 0, 0, 0)));
        assert_eq!(uptime_after(31 * DAY).elapsed(), Some(Elapsed::new(0, 0, 0, 0)));
        assert_eq!(
            uptime_after(32 * DAY + HOUR).to_string(),
            "1 day 1 hour 0 minute 0 second"
        );
    }

    #[test]
    fn test_uptime_boot_in_future() {
        // One second before the epoch is 1969-12-31T23:59:59Z.
        let uptime = uptime_after(-SECOND);
        assert_eq!(uptime.elapsed(), Some(Elapsed::new(30, 23, 59, 59)));
        assert_eq!(uptime.to_string(), "30 days 23 hours 59 minutes 59 seconds");
    }

    #[test]
    fn test_uptime_fields_in_range() {
        let mut millis = 0;
        while millis < 31 * DAY {
            let elapsed = uptime_after(millis).elapsed().expect("valid uptime");
            assert!(elapsed.days <= 30);
            assert!(elapsed.hours <= 23);
            assert!(elapsed.minutes <= 59);
            assert!(elapsed.seconds <= 59);
            millis += 7 * HOUR + 13 * MINUTE + 17 * SECOND + 19;
        }
    }

    #[test]
    fn test_uptime_format_is_stable() {
        let uptime = uptime_after(5 * HOUR + 2 * SECOND);
        assert_eq!(uptime.to_string(), uptime.to_string());
    }

    #[test]
    fn test_invalid_boot_renders_nan() {
        let uptime = Uptime::compute(BootInstant::parse("soon"), BOOT * 1000);
        assert_eq!(uptime.elapsed(), None);
        assert_eq!(uptime.to_string(), "NaN day NaN hour NaN minute NaN second");
    }

    #[test]
    fn test_unrepresentable_uptime_is_invalid() {
        let overflow = Uptime::compute(BootInstant::from_seconds(i64::MAX), 0);
        assert_eq!(overflow.elapsed(), None);

        let too_far = Uptime::compute(BootInstant::from_seconds(0), i64::MAX);
        assert_eq!(too_far.elapsed(), None);
    }

    #[test]
    fn test_parse_boot_time() {
        assert_eq!(BootInstant::parse("1548028800").seconds(), Some(BOOT));
        assert_eq!(BootInstant::parse("  42\n").seconds(), Some(42));
        assert_eq!(BootInstant::parse("42abc").seconds(), Some(42));
        assert_eq!(BootInstant::parse("+7").seconds(), Some(7));
        assert_eq!(BootInstant::parse("-5").seconds(), Some(-5));
        assert_eq!(BootInstant::parse("0x1A").seconds(), Some(26));
        assert_eq!(BootInstant::parse("12.9").seconds(), Some(12));
    }

    #[test]
    fn test_parse_invalid_boot_time() {
        assert!(!BootInstant::parse("").is_valid());
        assert!(!BootInstant::parse("abc").is_valid());
        assert!(!BootInstant::parse("-").is_valid());
        assert!(!BootInstant::parse("0x").is_valid());
        assert!(!BootInstant::parse("99999999999999999999").is_valid());
    }

    #[test]
    fn test_boot_from_uptime() {
        let boot = BootInstant::from_uptime(Duration::from_secs(3661), BOOT * 1000 + 999);
        assert_eq!(boot.seconds(), Some(BOOT - 3661));
    }

    #[test]
    fn test_boot_from_huge_uptime_saturates() {
        let boot = BootInstant::from_uptime(Duration::from_secs(u64::MAX), BOOT * 1000);
        assert_eq!(boot.seconds(), Some(BOOT - i64::MAX));
        assert!(Uptime::compute(boot, BOOT * 1000).to_string().starts_with("NaN"));
    }

    #[test]
    fn test_boot_from_system() {
        let system = System::new();
        if let Ok(boot) = BootInstant::from_system(&system, BOOT * 1000) {
            assert!(boot.seconds().expect("valid boot") <= BOOT);
        }
    }
}
