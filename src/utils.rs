/// Seconds used when a rest string carries no number at all.
pub const DEFAULT_REST_SECS: i64 = 60;

/// Extract the rest length in seconds from a human string like "90 sec".
/// Takes the first run of digits; anything unparseable falls back to 60.
pub fn parse_rest_secs(raw: &str) -> i64 {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().unwrap_or(DEFAULT_REST_SECS)
}

/// Format seconds as MM:SS for the live clocks.
pub fn format_clock(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Format a span as HH:MM:SS for session summaries.
pub fn format_duration(duration: chrono::Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    let seconds = duration.num_seconds() % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_strings_take_the_first_integer() {
        assert_eq!(parse_rest_secs("60 sec"), 60);
        assert_eq!(parse_rest_secs("90 sec"), 90);
        assert_eq!(parse_rest_secs("rest 45s"), 45);
        assert_eq!(parse_rest_secs("120"), 120);
        assert_eq!(parse_rest_secs("1 min"), 1);
    }

    #[test]
    fn unparseable_rest_defaults_to_sixty() {
        assert_eq!(parse_rest_secs("short"), 60);
        assert_eq!(parse_rest_secs(""), 60);
        assert_eq!(parse_rest_secs("a while"), 60);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(-3), "00:00");
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(chrono::Duration::seconds(3725)), "01:02:05");
        assert_eq!(format_duration(chrono::Duration::seconds(59)), "00:00:59");
    }
}
