//! Daily incident summary parsing.
//!
//! A summary row reads
//!
//! ```text
//! 12/4/2024 0:04   2024-00088290   1450 ALAMEDA ST   Traffic Stop   OK0140200
//! ```
//!
//! i.e. date/time, incident number, location, nature and the originating
//! agency identifier. Text extraction does not always keep the column
//! gaps, and long locations can wrap onto the next line, so rows are
//! assembled line by line until the ORI code closes them. Location and
//! nature are split on wide gaps when present, otherwise at the first
//! mixed-case word.

use std::sync::LazyLock;

use incident_lens_incident_models::{
    DATE_TIME_FIELD, INCIDENT_NUMBER_FIELD, INCIDENT_ORI_FIELD, LOCATION_FIELD, NATURE_FIELD,
    RawIncident,
};
use regex::Regex;

/// Maximum number of lines appended to an open row. Covers the four cells
/// after the timestamp landing on lines of their own, plus wrapped
/// location and nature text.
const MAX_CONTINUATION_LINES: usize = 6;

/// All-caps words that start a nature rather than end a location.
const NATURE_PREFIXES: &[&str] = &["911", "COP", "DDACTS", "DUI", "DWI", "EMS", "MVA"];

static ROW_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2}\b").expect("valid row start pattern")
});

static ROW_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(?:OK\d{7}|EMSSTAT|\d{5})$").expect("valid row end pattern")
});

static ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<date_time>\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2})\s+(?P<number>\d{4}-\d{8})(?:\s+(?P<body>.*?))?\s+(?P<ori>OK\d{7}|EMSSTAT|\d{5})$",
    )
    .expect("valid row pattern")
});

static WIDE_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid gap pattern"));

/// A row being assembled from one or more lines.
struct OpenRow {
    text: String,
    continuations: usize,
}

/// Parses summary text into rows, skipping headers, footers and lines that
/// do not form a complete row.
#[must_use]
pub fn parse(text: &str) -> Vec<RawIncident> {
    let mut records = Vec::new();
    let mut open: Option<OpenRow> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if ROW_START.is_match(line) {
            if let Some(row) = open.take() {
                log::debug!("Dropping incomplete summary row: {}", row.text);
            }
            open = Some(OpenRow {
                text: line.to_owned(),
                continuations: 0,
            });
        } else if let Some(row) = open.as_mut() {
            if row.continuations >= MAX_CONTINUATION_LINES {
                log::debug!("Dropping runaway summary row: {}", row.text);
                open = None;
                continue;
            }
            row.text.push_str("  ");
            row.text.push_str(line);
            row.continuations += 1;
        } else {
            log::trace!("Skipping non-row line: {line}");
            continue;
        }

        if let Some(row) = open.as_ref()
            && ROW_END.is_match(&row.text)
        {
            if let Some(record) = parse_row(&row.text) {
                records.push(record);
            } else {
                log::debug!("Unparseable summary row: {}", row.text);
            }
            open = None;
        }
    }

    if let Some(row) = open {
        log::debug!("Dropping incomplete trailing summary row: {}", row.text);
    }

    records
}

/// Parses one assembled row.
fn parse_row(text: &str) -> Option<RawIncident> {
    let caps = ROW.captures(text)?;
    let body = caps.name("body").map_or("", |m| m.as_str().trim());
    let (location, nature) = split_location_nature(body);

    let date_time = caps["date_time"].split_whitespace().collect::<Vec<_>>().join(" ");

    Some(
        RawIncident::new()
            .with(DATE_TIME_FIELD, date_time)
            .with(INCIDENT_NUMBER_FIELD, &caps["number"])
            .with(LOCATION_FIELD, location)
            .with(NATURE_FIELD, nature)
            .with(INCIDENT_ORI_FIELD, &caps["ori"]),
    )
}

/// Splits the text between incident number and ORI into location and
/// nature.
fn split_location_nature(body: &str) -> (String, String) {
    let parts: Vec<&str> = WIDE_GAP
        .split(body)
        .filter(|part| !part.is_empty())
        .collect();

    if let Some((nature, location)) = parts.split_last()
        && !location.is_empty()
    {
        return (location.join(" "), (*nature).to_owned());
    }

    let tokens: Vec<&str> = body.split_whitespace().collect();
    let mut split = tokens
        .iter()
        .position(|token| token.chars().any(|c| c.is_ascii_lowercase()))
        .unwrap_or(tokens.len());

    while split > 0 && NATURE_PREFIXES.contains(&tokens[split - 1]) {
        split -= 1;
    }

    (tokens[..split].join(" "), tokens[split..].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "\
NORMAN POLICE DEPARTMENT
Daily Incident Summary (Public)
Date / Time Incident Number Location Nature Incident ORI
12/4/2024 0:04 2024-00088290 1450 ALAMEDA ST Traffic Stop OK0140200
12/4/2024 0:17 2024-00088291 2000 W BROOKS ST MVA Non Injury OK0140200
12/4/2024 0:39 2024-00088292 E ALAMEDA ST / 12TH AVE SE COP DDACTS OK0140200
12/4/2024 1:02 2024-00027081 1122 W ROCK CREEK RD 911 Call Nature Unknown EMSSTAT
12/4/2024 1:15 2024-00016320 3300 N FLOOD AVE Sick Person 14005
12/5/2024
";

    #[test]
    fn parses_every_row_on_a_page() {
        let rows = parse(PAGE);
        assert_eq!(rows.len(), 5);

        assert_eq!(rows[0].date_time(), Some("12/4/2024 0:04"));
        assert_eq!(rows[0].get(INCIDENT_NUMBER_FIELD), Some("2024-00088290"));
        assert_eq!(rows[0].get(LOCATION_FIELD), Some("1450 ALAMEDA ST"));
        assert_eq!(rows[0].nature(), Some("Traffic Stop"));
        assert_eq!(rows[0].get(INCIDENT_ORI_FIELD), Some("OK0140200"));
    }

    #[test]
    fn keeps_all_caps_nature_prefixes_with_the_nature() {
        let rows = parse(PAGE);
        assert_eq!(rows[1].get(LOCATION_FIELD), Some("2000 W BROOKS ST"));
        assert_eq!(rows[1].nature(), Some("MVA Non Injury"));
        assert_eq!(rows[2].get(LOCATION_FIELD), Some("E ALAMEDA ST / 12TH AVE SE"));
        assert_eq!(rows[2].nature(), Some("COP DDACTS"));
        assert_eq!(rows[3].nature(), Some("911 Call Nature Unknown"));
        assert_eq!(rows[3].get(INCIDENT_ORI_FIELD), Some("EMSSTAT"));
        assert_eq!(rows[4].get(INCIDENT_ORI_FIELD), Some("14005"));
    }

    #[test]
    fn splits_on_wide_gaps_when_layout_is_kept() {
        let text = "12/4/2024 2:10   2024-00088300   401 W MAIN ST   Alarm Holdup/Panic   OK0140200";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(LOCATION_FIELD), Some("401 W MAIN ST"));
        assert_eq!(rows[0].nature(), Some("Alarm Holdup/Panic"));
    }

    #[test]
    fn joins_wrapped_lines() {
        let text = "12/4/2024 3:00 2024-00088301 1601 E IMHOFF RD\nAPT 12\nWelfare Check OK0140200\n";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(LOCATION_FIELD), Some("1601 E IMHOFF RD APT 12"));
        assert_eq!(rows[0].nature(), Some("Welfare Check"));
    }

    #[test]
    fn joins_cells_extracted_one_per_line() {
        let text = "12/4/2024 0:04\n2024-00088290\n1450 ALAMEDA ST\nTraffic Stop\nOK0140200\n\
                    12/4/2024 0:17\n2024-00088291\n2000 W BROOKS ST\nAPT 4\nMVA Non Injury\nOK0140200\n";
        let rows = parse(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(LOCATION_FIELD), Some("1450 ALAMEDA ST"));
        assert_eq!(rows[0].nature(), Some("Traffic Stop"));
        assert_eq!(rows[1].get(LOCATION_FIELD), Some("2000 W BROOKS ST APT 4"));
        assert_eq!(rows[1].nature(), Some("MVA Non Injury"));
    }

    #[test]
    fn runaway_rows_are_dropped() {
        let text = "12/4/2024 6:00 2024-00088305\nA\nB\nC\nD\nE\nF\nG\nLarceny OK0140200";
        assert!(parse(text).is_empty());
    }

    #[test]
    fn row_with_blank_location_and_nature_is_kept() {
        let rows = parse("12/4/2024 4:00 2024-00088302 OK0140200");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(LOCATION_FIELD), Some(""));
        assert_eq!(rows[0].nature(), Some(""));
    }

    #[test]
    fn incomplete_rows_are_dropped() {
        let text = "12/4/2024 5:00 2024-00088303 100 MAIN ST\n\
                    12/4/2024 5:05 2024-00088304 200 ELM ST Larceny OK0140200";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(INCIDENT_NUMBER_FIELD), Some("2024-00088304"));
    }
}
