use std::sync::LazyLock;

use regex::Regex;

static LOCAL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]{1,2})\s+(\w+)\s+([0-9]{4})").expect("valid regex"));
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("valid regex"));

fn month_number(name: &str) -> Option<&'static str> {
    let month = match name.to_lowercase().as_str() {
        "januari" => "01",
        "februari" => "02",
        "maret" => "03",
        "april" => "04",
        "mei" => "05",
        "juni" => "06",
        "juli" => "07",
        "agustus" => "08",
        "september" => "09",
        "oktober" => "10",
        "november" => "11",
        "desember" => "12",
        _ => return None,
    };
    Some(month)
}

/// Normalize an Indonesian date ("15 Juni 2020") or an ISO date to `YYYY-MM-DD`.
///
/// Returns `None` for blank or unrecognized input. Calendar validity is not
/// checked.
pub fn normalize(text: Option<&str>) -> Option<String> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = LOCAL_DATE.captures(text) {
        if let Some(month) = month_number(&caps[2]) {
            return Some(format!("{}-{}-{:0>2}", &caps[3], month, &caps[1]));
        }
    }

    ISO_DATE.find(text).map(|m| m.as_str().to_string())
}
