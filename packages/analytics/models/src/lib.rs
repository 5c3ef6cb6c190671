#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis configuration and report types.
//!
//! The analysis pipeline turns a batch of incidents into an
//! [`AnalysisReport`]: every incident placed in a cluster and on a 2-D
//! plane, the most frequent natures, and each cluster's share of the batch.

use incident_lens_incident_models::AnalyzedIncident;
use serde::{Deserialize, Serialize};

/// Number of clusters incidents are partitioned into.
pub const DEFAULT_CLUSTERS: usize = 4;
/// Seed for cluster initialisation and projection.
pub const DEFAULT_SEED: u64 = 42;
/// Number of entries in the top-natures table.
pub const DEFAULT_TOP_NATURES: usize = 10;
/// Upper bound on k-means iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
/// Relative convergence tolerance for k-means.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Shown when no incident survives date validation.
pub const NO_VALID_DATA_MESSAGE: &str = "No valid incident data available for display.";
/// Shown when vectorisation, clustering or projection fails.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to generate visualizations.";

/// Tunables for the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of clusters (`k`).
    pub clusters: usize,
    /// Random seed; identical input and seed give identical output.
    pub seed: u64,
    /// Length of the top-natures table.
    pub top_natures: usize,
    /// Upper bound on k-means iterations.
    pub max_iterations: usize,
    /// Convergence tolerance, relative to the mean feature variance.
    pub tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_CLUSTERS,
            seed: DEFAULT_SEED,
            top_natures: DEFAULT_TOP_NATURES,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// How often a nature occurs in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatureCount {
    /// The nature text.
    pub nature: String,
    /// Number of incidents with this nature.
    pub count: u64,
}

/// One cluster's slice of the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterShare {
    /// Cluster id.
    pub cluster: usize,
    /// Number of incidents in the cluster.
    pub count: u64,
    /// Angular share, `2π * count / total`.
    pub angle: f64,
    /// Cumulative angle where this slice starts.
    pub start_angle: f64,
    /// Cumulative angle where this slice ends.
    pub end_angle: f64,
    /// Slice colour.
    pub color: String,
}

/// Output of a successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Every valid incident with its cluster, coordinates and colour.
    pub incidents: Vec<AnalyzedIncident>,
    /// Most frequent natures, count descending.
    pub top_natures: Vec<NatureCount>,
    /// Per-cluster shares, count descending.
    pub cluster_shares: Vec<ClusterShare>,
    /// Rows dropped for a missing or unparseable timestamp.
    pub dropped: usize,
}

impl AnalysisReport {
    /// Counts and tables without the per-incident points.
    #[must_use]
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            analyzed: self.incidents.len(),
            dropped: self.dropped,
            top_natures: self.top_natures.clone(),
            cluster_shares: self.cluster_shares.clone(),
        }
    }
}

/// Headline numbers of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Incidents that were clustered.
    pub analyzed: usize,
    /// Rows dropped for a missing or unparseable timestamp.
    pub dropped: usize,
    /// Most frequent natures, count descending.
    pub top_natures: Vec<NatureCount>,
    /// Per-cluster shares, count descending.
    pub cluster_shares: Vec<ClusterShare>,
}

/// Result of running the pipeline over a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// The batch was analysed.
    Report(AnalysisReport),
    /// No row had a valid timestamp; nothing to analyse.
    NoValidData {
        /// Rows dropped for a missing or unparseable timestamp.
        dropped: usize,
    },
}

impl AnalysisOutcome {
    /// Returns the report, if analysis ran.
    #[must_use]
    pub fn into_report(self) -> Option<AnalysisReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::NoValidData { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_constants() {
        let config = AnalysisConfig::default();
        assert_eq!(config.clusters, 4);
        assert_eq!(config.seed, 42);
        assert_eq!(config.top_natures, 10);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{ "seed": 7 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.clusters, DEFAULT_CLUSTERS);
    }

    #[test]
    fn summary_serialises_camel_case() {
        let report = AnalysisReport {
            incidents: Vec::new(),
            top_natures: vec![NatureCount {
                nature: "Alarm".to_owned(),
                count: 2,
            }],
            cluster_shares: Vec::new(),
            dropped: 1,
        };
        let json = serde_json::to_value(report.summary()).unwrap();
        assert_eq!(json["analyzed"], 0);
        assert_eq!(json["topNatures"][0]["nature"], "Alarm");
        assert!(json.get("clusterShares").is_some());
    }

    #[test]
    fn no_valid_data_is_tagged() {
        let json = serde_json::to_value(AnalysisOutcome::NoValidData { dropped: 3 }).unwrap();
        assert_eq!(json["status"], "no_valid_data");
        assert_eq!(json["dropped"], 3);
    }
}
