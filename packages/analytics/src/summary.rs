//! Frequency tables over an analysed batch.
//!
//! Counts are ordered by count descending; equal counts keep the order in
//! which their key first appeared in the batch.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::hash::Hash;

use incident_lens_analytics_models::{ClusterShare, NatureCount};
use incident_lens_incident_models::palette::{CATEGORY10, category20c};

/// Counts occurrences, ordered by count descending then first appearance.
fn ranked_counts<K, I>(items: I) -> Vec<(K, u64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut counts: Vec<(K, u64)> = Vec::new();
    let mut positions: HashMap<K, usize> = HashMap::new();

    for item in items {
        if let Some(&i) = positions.get(&item) {
            counts[i].1 += 1;
        } else {
            positions.insert(item.clone(), counts.len());
            counts.push((item, 1));
        }
    }

    // Stable sort keeps first-appearance order among ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// The `limit` most frequent natures.
#[must_use]
pub fn top_natures<'a, I>(natures: I, limit: usize) -> Vec<NatureCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ranked = ranked_counts(natures);
    ranked.truncate(limit);
    ranked
        .into_iter()
        .map(|(nature, count)| NatureCount {
            nature: nature.to_owned(),
            count,
        })
        .collect()
}

/// Each cluster's share of the batch, as pie-chart slices.
///
/// Slice colours come from the 20-colour categorical palette sized to the
/// number of clusters; beyond twenty clusters the 10-colour palette is
/// cycled.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cluster_shares(labels: &[usize]) -> Vec<ClusterShare> {
    let ranked = ranked_counts(labels.iter().copied());
    let total: u64 = ranked.iter().map(|(_, count)| count).sum();
    let palette: Vec<&str> = category20c(ranked.len()).map_or_else(
        || CATEGORY10.iter().copied().cycle().take(ranked.len()).collect(),
        |colors| colors.to_vec(),
    );

    let mut start = 0.0;
    ranked
        .into_iter()
        .zip(palette)
        .map(|((cluster, count), color)| {
            let angle = count as f64 / total as f64 * TAU;
            let share = ClusterShare {
                cluster,
                count,
                angle,
                start_angle: start,
                end_angle: start + angle,
                color: color.to_owned(),
            };
            start += angle;
            share
        })
        .collect()
}
