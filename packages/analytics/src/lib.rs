#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Text clustering and summary statistics for incident batches.
//!
//! [`analyze`] validates timestamps, vectorises every nature with TF-IDF,
//! partitions the vectors with seeded k-means, projects them to two
//! dimensions with PCA, and aggregates nature and cluster counts into an
//! [`AnalysisReport`](incident_lens_analytics_models::AnalysisReport).

pub mod kmeans;
pub mod pca;
pub mod pipeline;
pub mod summary;
pub mod tfidf;

use thiserror::Error;

pub use pipeline::{analyze, validate};

/// Errors that can occur during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// No nature produced a single token.
    #[error("Empty vocabulary: no nature contains a token of two or more word characters")]
    EmptyVocabulary,

    /// The configured cluster count is zero.
    #[error("Invalid cluster count: {clusters}")]
    InvalidClusterCount {
        /// Configured number of clusters.
        clusters: usize,
    },

    /// Fewer samples than clusters.
    #[error("Too few samples for clustering: {samples} samples, {clusters} clusters")]
    TooFewSamples {
        /// Number of valid incidents.
        samples: usize,
        /// Configured number of clusters.
        clusters: usize,
    },

    /// The data cannot be projected to two dimensions.
    #[error("Too few dimensions for a 2-D projection: {samples} samples, {features} features")]
    TooFewDimensions {
        /// Number of valid incidents.
        samples: usize,
        /// Vocabulary size.
        features: usize,
    },

    /// A cluster id has no point colour.
    #[error("No colour available for cluster {cluster}")]
    Palette {
        /// The cluster id.
        cluster: usize,
    },
}
