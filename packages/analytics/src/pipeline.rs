//! The end-to-end analysis of one incident batch.

use incident_lens_analytics_models::{AnalysisConfig, AnalysisOutcome, AnalysisReport};
use incident_lens_incident_models::palette::cluster_color;
use incident_lens_incident_models::{AnalyzedIncident, IncidentRecord, RawIncident};

use crate::AnalyticsError;
use crate::kmeans::KMeans;
use crate::pca::project_2d;
use crate::summary::{cluster_shares, top_natures};
use crate::tfidf;

/// Keeps the rows whose timestamp parses and counts the rest.
#[must_use]
pub fn validate(raw: &[RawIncident]) -> (Vec<IncidentRecord>, usize) {
    let mut records = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for row in raw {
        match IncidentRecord::from_raw(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::debug!("Dropping incident row: {e}");
                dropped += 1;
            }
        }
    }

    (records, dropped)
}

/// Clusters, projects and summarises a batch of incidents.
///
/// Rows with a missing or unparseable timestamp are dropped first; if none
/// remain the outcome is [`AnalysisOutcome::NoValidData`]. The same input
/// and config always give the same report.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the surviving natures cannot be
/// vectorised, clustered or projected. The cause is logged before it is
/// returned.
pub fn analyze(
    raw: &[RawIncident],
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome, AnalyticsError> {
    run(raw, config).inspect_err(|e| log::error!("Visualization error: {e}"))
}

fn run(raw: &[RawIncident], config: &AnalysisConfig) -> Result<AnalysisOutcome, AnalyticsError> {
    let (records, dropped) = validate(raw);

    if records.is_empty() {
        log::warn!("No valid incidents to analyse ({dropped} dropped)");
        return Ok(AnalysisOutcome::NoValidData { dropped });
    }

    log::info!(
        "Analysing {} incidents ({dropped} dropped)",
        records.len()
    );

    // ── Vectorise, cluster, project ──
    let natures: Vec<&str> = records.iter().map(|r| r.nature.as_str()).collect();
    let matrix = tfidf::fit_transform(&natures)?;
    let dense = matrix.to_dense();

    let clustering = KMeans::new(config.clusters)
        .with_seed(config.seed)
        .with_max_iterations(config.max_iterations)
        .with_tolerance(config.tolerance)
        .fit(&dense)?;

    let projection = project_2d(&dense, config.seed)?;

    // ── Assemble ──
    let top = top_natures(natures.iter().copied(), config.top_natures);
    let shares = cluster_shares(&clustering.labels);

    let incidents = records
        .into_iter()
        .zip(&clustering.labels)
        .zip(&projection.points)
        .map(|((record, &cluster), &(x, y))| {
            let color = cluster_color(cluster).ok_or(AnalyticsError::Palette { cluster })?;
            Ok(AnalyzedIncident {
                record,
                cluster,
                x,
                y,
                color: color.to_owned(),
            })
        })
        .collect::<Result<Vec<_>, AnalyticsError>>()?;

    log::info!(
        "Analysis complete: {} incidents in {} clusters, {} distinct top natures",
        incidents.len(),
        shares.len(),
        top.len()
    );

    Ok(AnalysisOutcome::Report(AnalysisReport {
        incidents,
        top_natures: top,
        cluster_shares: shares,
        dropped,
    }))
}
