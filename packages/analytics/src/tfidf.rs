//! TF-IDF vectorisation of short texts.
//!
//! Texts are lowercased and split into tokens of two or more word
//! characters. The vocabulary is built from the batch alone and indexed
//! in sorted term order. Weights are raw term counts times the smoothed
//! inverse document frequency `ln((1 + n) / (1 + df)) + 1`, and every row
//! is scaled to unit L2 norm.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::AnalyticsError;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"));

/// Sparse document-term matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfMatrix {
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    rows: Vec<Vec<(usize, f64)>>,
}

impl TfidfMatrix {
    /// Number of documents.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Number of distinct terms.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Terms in feature order.
    #[must_use]
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Inverse document frequency per feature.
    #[must_use]
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Non-zero `(feature, weight)` pairs of one document, by feature.
    #[must_use]
    pub fn row(&self, index: usize) -> &[(usize, f64)] {
        &self.rows[index]
    }

    /// Expands the matrix to dense rows.
    #[must_use]
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                let mut dense = vec![0.0; self.vocabulary.len()];
                for &(feature, weight) in row {
                    dense[feature] = weight;
                }
                dense
            })
            .collect()
    }
}

/// Splits a text into lowercase tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Learns the vocabulary of `documents` and returns their TF-IDF matrix.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptyVocabulary`] if no document contains a
/// single token.
#[allow(clippy::cast_precision_loss)]
pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> Result<TfidfMatrix, AnalyticsError> {
    let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

    let vocabulary: Vec<String> = tokenized
        .iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if vocabulary.is_empty() {
        return Err(AnalyticsError::EmptyVocabulary);
    }

    let index: BTreeMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, term)| (term.as_str(), i))
        .collect();

    let counts: Vec<BTreeMap<usize, f64>> = tokenized
        .iter()
        .map(|tokens| {
            let mut counts = BTreeMap::new();
            for token in tokens {
                *counts.entry(index[token.as_str()]).or_insert(0.0) += 1.0;
            }
            counts
        })
        .collect();

    let mut document_frequency = vec![0_usize; vocabulary.len()];
    for doc in &counts {
        for &feature in doc.keys() {
            document_frequency[feature] += 1;
        }
    }

    let n = documents.len() as f64;
    let idf: Vec<f64> = document_frequency
        .iter()
        .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
        .collect();

    let rows = counts
        .into_iter()
        .map(|doc| {
            let mut row: Vec<(usize, f64)> = doc
                .into_iter()
                .map(|(feature, count)| (feature, count * idf[feature]))
                .collect();
            let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, w) in &mut row {
                    *w /= norm;
                }
            }
            row
        })
        .collect();

    log::debug!(
        "TF-IDF: {} documents, {} terms",
        documents.len(),
        vocabulary.len()
    );

    Ok(TfidfMatrix {
        vocabulary,
        idf,
        rows,
    })
}
