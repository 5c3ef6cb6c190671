//! The `analyze` command: aggregate -> analyze -> render.
//!
//! Collects incidents from every URL and PDF, clusters them, prints a
//! summary and writes the HTML report (and optionally the chart specs as
//! JSON). Failures after aggregation are written into the report page the
//! same way the server shows them.

use std::path::{Path, PathBuf};
use std::time::Instant;

use incident_lens_analytics::AnalyticsError;
use incident_lens_analytics_models::{
    ANALYSIS_FAILED_MESSAGE, AnalysisConfig, AnalysisOutcome, AnalysisSummary,
    NO_VALID_DATA_MESSAGE,
};
use incident_lens_chart::{ChartSet, render_charts, render_page};
use incident_lens_cli_utils::{IndicatifProgress, MultiProgress};
use incident_lens_ingest::{Aggregator, UploadedFile, split_urls};
use incident_lens_scraper::{FetchConfig, HttpFetcher};

/// Inputs and outputs of one `analyze` run.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// URLs given one per flag.
    pub url: Vec<String>,
    /// Whitespace-separated URL list.
    pub urls: Option<String>,
    /// Local PDF files.
    pub files: Vec<PathBuf>,
    /// HTML report destination.
    pub output: PathBuf,
    /// Optional chart-spec JSON destination.
    pub json: Option<PathBuf>,
}

impl AnalyzeOptions {
    /// All URLs, flags first.
    fn all_urls(&self) -> Vec<String> {
        let mut urls = self.url.clone();
        if let Some(list) = &self.urls {
            urls.extend(split_urls(list));
        }
        urls
    }
}

async fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadedFile>, Box<dyn std::error::Error>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let filename = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        files.push(UploadedFile::new(filename, bytes));
    }
    Ok(files)
}

/// Runs the `analyze` command.
///
/// # Errors
///
/// Returns an error if a file cannot be read, no incidents are found, or
/// an output cannot be written.
pub async fn run(
    multi: &MultiProgress,
    fetch: &FetchConfig,
    analysis: AnalysisConfig,
    options: &AnalyzeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let urls = options.all_urls();
    let files = read_files(&options.files).await?;

    // ── Aggregate ──
    let fetcher = HttpFetcher::new(fetch)?;
    let progress = IndicatifProgress::inputs_bar(multi, "Collecting incidents");
    let outcome = Aggregator::new(&fetcher)
        .with_progress(progress)
        .run(&urls, &files)
        .await?;

    for error in &outcome.errors {
        println!("  ! {error}");
    }

    // ── Analyze ──
    let incidents = outcome.incidents;
    let result =
        tokio::task::spawn_blocking(move || incident_lens_analytics::analyze(&incidents, &analysis))
            .await?;

    // ── Render ──
    let summary = write_outputs(result, &options.output, options.json.as_deref())?;

    if let Some(summary) = summary {
        print_summary(&summary);
    }
    println!("Report written to {}", options.output.display());
    log::info!("Analysis finished in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}

/// Writes the report page (and chart JSON on success) for an analysis
/// result. Returns the summary when analysis produced one.
fn write_outputs(
    result: Result<AnalysisOutcome, AnalyticsError>,
    output: &Path,
    json: Option<&Path>,
) -> Result<Option<AnalysisSummary>, Box<dyn std::error::Error>> {
    let (charts, summary, error): (Option<ChartSet>, Option<AnalysisSummary>, Option<&str>) =
        match result {
            Ok(AnalysisOutcome::Report(report)) => {
                (Some(render_charts(&report)), Some(report.summary()), None)
            }
            Ok(AnalysisOutcome::NoValidData { dropped }) => {
                log::warn!("All {dropped} incident(s) had an invalid date");
                (None, None, Some(NO_VALID_DATA_MESSAGE))
            }
            Err(_) => (None, None, Some(ANALYSIS_FAILED_MESSAGE)),
        };

    if let Some(message) = error {
        println!("{message}");
    }

    std::fs::write(output, render_page(charts.as_ref(), error, false)?)?;

    if let (Some(path), Some(charts)) = (json, &charts) {
        std::fs::write(path, charts.to_json()?)?;
        println!("Chart specs written to {}", path.display());
    }

    Ok(summary)
}

fn print_summary(summary: &AnalysisSummary) {
    println!();
    println!(
        "Analyzed {} incident(s), dropped {}",
        summary.analyzed, summary.dropped
    );

    println!();
    println!("Top incident types:");
    for nature in &summary.top_natures {
        println!("  {:>5}  {}", nature.count, nature.nature);
    }

    println!();
    println!("Clusters:");
    for share in &summary.cluster_shares {
        println!(
            "  cluster {}: {} incident(s) ({:.1}%)",
            share.cluster,
            share.count,
            share.angle / std::f64::consts::TAU * 100.0
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use incident_lens_incident_models::RawIncident;

    use super::*;

    fn batch() -> Vec<RawIncident> {
        ["Traffic Stop", "Larceny", "Alarm", "Traffic Stop", "Sick Person", "Fraud"]
            .iter()
            .map(|nature| {
                RawIncident::new()
                    .with("Date Time", "3/1/2024 8:30")
                    .with("Nature", *nature)
            })
            .collect()
    }

    #[test]
    fn urls_from_flags_and_list_are_merged() {
        let options = AnalyzeOptions {
            url: vec!["https://a.test".to_owned()],
            urls: Some(" https://b.test\nhttps://c.test ".to_owned()),
            ..AnalyzeOptions::default()
        };
        assert_eq!(
            options.all_urls(),
            vec!["https://a.test", "https://b.test", "https://c.test"]
        );
    }

    #[test]
    fn successful_analysis_writes_report_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.html");
        let json = dir.path().join("charts.json");

        let result = incident_lens_analytics::analyze(&batch(), &AnalysisConfig::default());
        let summary = write_outputs(result, &output, Some(&json)).unwrap().unwrap();

        assert_eq!(summary.analyzed, 6);
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("chart-scatter"));
        let charts = std::fs::read_to_string(&json).unwrap();
        assert!(charts.contains("Top 10 Incident Types"));
    }

    #[test]
    fn invalid_dates_write_the_message() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.html");
        let json = dir.path().join("charts.json");

        let summary = write_outputs(
            Ok(AnalysisOutcome::NoValidData { dropped: 2 }),
            &output,
            Some(&json),
        )
        .unwrap();

        assert!(summary.is_none());
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains(NO_VALID_DATA_MESSAGE));
        assert!(!json.exists());
    }

    #[test]
    fn analysis_failure_writes_the_generic_message() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.html");

        write_outputs(Err(AnalyticsError::EmptyVocabulary), &output, None).unwrap();

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains(ANALYSIS_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_files(&[dir.path().join("missing.pdf")]).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }

    #[tokio::test]
    async fn files_keep_their_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();

        let files = read_files(&[path]).await.unwrap();
        assert_eq!(files[0].filename, "summary.pdf");
        assert!(files[0].is_pdf());
    }
}
