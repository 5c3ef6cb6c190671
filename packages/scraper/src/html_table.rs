//! HTML table extraction.
//!
//! Locates the first `<table>` element and turns each body row
//! into a [`RawIncident`] keyed by the column headers. Headers come from
//! the `<thead>`; tables without one use their first row as the header.

use std::sync::LazyLock;

use incident_lens_incident_models::RawIncident;
use scraper::{ElementRef, Html, Selector};

use crate::ScrapeError;

static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static HEADER_CELL: LazyLock<Selector> =
    LazyLock::new(|| selector("thead tr th, thead tr td"));
static BODY_ROW: LazyLock<Selector> = LazyLock::new(|| selector("tbody tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td, th"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

/// Extracts rows from the first `<table>` in `html`.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if no table is found or the table has no
/// header cells.
pub fn extract(html: &str) -> Result<Vec<RawIncident>, ScrapeError> {
    let document = Html::parse_document(html);

    // ── Locate the table ────────────────────────────────────────────
    let table = document
        .select(&TABLE)
        .next()
        .ok_or_else(|| ScrapeError::Parse("no table found in document".to_owned()))?;

    // ── Extract headers ─────────────────────────────────────────────
    let mut headers: Vec<String> = table.select(&HEADER_CELL).map(cell_text).collect();
    let mut rows: Vec<ElementRef<'_>> = table.select(&BODY_ROW).collect();

    if headers.is_empty() && !rows.is_empty() {
        let first = rows.remove(0);
        headers = first.select(&CELL).map(cell_text).collect();
    }

    if headers.iter().all(String::is_empty) {
        return Err(ScrapeError::Parse(
            "no header cells found in table".to_owned(),
        ));
    }

    // ── Extract body rows ───────────────────────────────────────────
    let mut records = Vec::new();

    for row in rows {
        let cells: Vec<String> = row.select(&CELL).map(cell_text).collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }

        let mut record = RawIncident::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            record.insert(header, cells.get(i).cloned().unwrap_or_default());
        }
        records.push(record);
    }

    log::debug!(
        "Extracted {} rows ({} columns) from HTML table",
        records.len(),
        headers.len()
    );

    Ok(records)
}

/// Returns the whitespace-collapsed text content of an element.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use incident_lens_incident_models::{DATE_TIME_FIELD, LOCATION_FIELD, NATURE_FIELD};

    const LISTING: &str = r"
        <html><body>
          <h1>Daily Activity</h1>
          <table id='incidents'>
            <thead>
              <tr><th>Date / Time</th><th>Incident Number</th><th>Location</th><th>Nature</th></tr>
            </thead>
            <tbody>
              <tr><td>12/4/2024 0:04</td><td>2024-00088290</td><td>1450 ALAMEDA ST</td><td>Traffic Stop</td></tr>
              <tr><td>12/4/2024 0:17</td><td>2024-00088291</td><td>W MAIN ST</td><td>Larceny</td></tr>
              <tr><td></td><td></td><td></td><td></td></tr>
            </tbody>
          </table>
        </body></html>";

    #[test]
    fn extracts_rows_keyed_by_canonical_headers() {
        let rows = extract(LISTING).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(DATE_TIME_FIELD), Some("12/4/2024 0:04"));
        assert_eq!(rows[0].get(LOCATION_FIELD), Some("1450 ALAMEDA ST"));
        assert_eq!(rows[1].get(NATURE_FIELD), Some("Larceny"));
    }

    #[test]
    fn uses_first_row_as_header_without_thead() {
        let html = "<table>\
            <tr><td>Date Time</td><td>Nature</td></tr>\
            <tr><td>1/2/2024 10:00</td><td>Alarm</td></tr>\
            </table>";
        let rows = extract(html).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nature(), Some("Alarm"));
    }

    #[test]
    fn short_rows_fill_missing_cells_with_empty_strings() {
        let html = "<table><thead><tr><th>Date Time</th><th>Nature</th></tr></thead>\
            <tbody><tr><td>1/2/2024 10:00</td></tr></tbody></table>";
        let rows = extract(html).unwrap();
        assert_eq!(rows[0].nature(), Some(""));
    }

    #[test]
    fn page_without_table_is_an_error() {
        let err = extract("<html><body><p>No data today.</p></body></html>").unwrap_err();
        assert!(err.to_string().contains("no table found"));
    }

    #[test]
    fn first_table_on_the_page_is_used() {
        let html = "<table><tr><th>Date Time</th><th>Nature</th></tr>\
            <tr><td>1/2/2024 10:00</td><td>Welfare Check</td></tr></table>\
            <table><tr><th>Unrelated</th></tr><tr><td>x</td></tr></table>";
        let rows = extract(html).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nature(), Some("Welfare Check"));
    }
}
