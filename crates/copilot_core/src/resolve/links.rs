use time::Duration;

use crate::domain::BlockKey;

/// `<url>/block/<id>,<id>,...` deep link into a course web page.
pub(crate) fn web_block_url(url: &str, keys: &[BlockKey]) -> String {
    let ids = keys
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{url}/block/{ids}")
}

/// Add `t=<seconds>` to the query string, keeping any `#fragment` last.
pub(crate) fn add_timestamp_to_url(url: &str, seconds: i64) -> String {
    let (base, fragment) = match url.find('#') {
        Some(i) => (&url[..i], &url[i..]),
        None => (url, ""),
    };
    let param = format!("t={seconds}");
    let with_query = match base.find('?') {
        Some(i) if i + 1 < base.len() => format!("{base}&{param}"),
        Some(_) => format!("{base}{param}"),
        None => format!("{base}?{param}"),
    };
    format!("{with_query}{fragment}")
}

/// `H:MM:SS`, hours unpadded and unbounded.
fn clock(seconds: i64) -> String {
    let d = Duration::seconds(seconds);
    format!(
        "{}:{:02}:{:02}",
        d.whole_hours(),
        d.whole_minutes() % 60,
        d.whole_seconds() % 60
    )
}

pub(crate) fn add_time_range_to_title(title: &str, start_secs: i64, end_secs: i64) -> String {
    format!("{title} ({}-{})", clock(start_secs), clock(end_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_joins_existing_query() {
        assert_eq!(
            add_timestamp_to_url("https://v.example/watch?v=abc", 42),
            "https://v.example/watch?v=abc&t=42"
        );
        assert_eq!(add_timestamp_to_url("https://v.example/x", 0), "https://v.example/x?t=0");
        assert_eq!(add_timestamp_to_url("https://v.example/x?", 5), "https://v.example/x?t=5");
        assert_eq!(
            add_timestamp_to_url("https://v.example/x?a=1#player", 5),
            "https://v.example/x?a=1&t=5#player"
        );
    }

    #[test]
    fn title_range_uses_clock_format() {
        assert_eq!(add_time_range_to_title("Lecture", 10, 65), "Lecture (0:00:10-0:01:05)");
        assert_eq!(add_time_range_to_title("L", 3600, 90061), "L (1:00:00-25:01:01)");
    }
}
