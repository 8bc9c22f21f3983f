//! Human readable periods, timestamps and the file naming convention.

use std::time::Duration;

use chrono::{DateTime, Utc};

const UNITS: [(u128, &str); 5] = [
    (60_000_000_000, "min"),
    (1_000_000_000, "s"),
    (1_000_000, "ms"),
    (1_000, "us"),
    (1, "ns"),
];

/// Renders a period with the largest unit that divides it exactly,
/// e.g. `1 s`, `100 ms`, `15 min`. With `underscore` set the separator is
/// `_`, which keeps the string file-name safe.
pub fn to_unit_string(period: Duration, underscore: bool) -> String {
    let separator = if underscore { "_" } else { " " };
    let nanos = period.as_nanos();

    for (factor, unit) in UNITS {
        if nanos != 0 && nanos % factor == 0 {
            return format!("{}{}{}", nanos / factor, separator, unit);
        }
    }
    format!("0{}ns", separator)
}

/// `yyyy-MM-ddTHH:mm:ssZ`
pub fn to_iso_string(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// `<yyyy-MM-ddTHH-mm-ss>Z_<period>.<extension>`
pub fn file_name(begin: DateTime<Utc>, sample_period: Duration, extension: &str) -> String {
    format!(
        "{}Z_{}.{}",
        begin.format("%Y-%m-%dT%H-%M-%S"),
        to_unit_string(sample_period, true),
        extension.trim_start_matches('.')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn picks_largest_exact_unit() {
        assert_eq!(to_unit_string(Duration::from_secs(1), false), "1 s");
        assert_eq!(to_unit_string(Duration::from_millis(100), true), "100_ms");
        assert_eq!(to_unit_string(Duration::from_secs(600), true), "10_min");
        assert_eq!(to_unit_string(Duration::from_secs(90), false), "90 s");
        assert_eq!(to_unit_string(Duration::from_nanos(1500), false), "1500 ns");
        assert_eq!(to_unit_string(Duration::from_micros(20), false), "20 us");
    }

    #[test]
    fn file_name_follows_convention() {
        let begin = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            file_name(begin, Duration::from_secs(1), "dat"),
            "2020-01-02T03-04-05Z_1_s.dat"
        );
        assert_eq!(to_iso_string(begin), "2020-01-02T03:04:05Z");
    }
}
