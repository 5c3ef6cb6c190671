#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chart rendering for analysis reports.
//!
//! [`render_charts`] turns an [`AnalysisReport`] into three Vega-Lite
//! specs: the cluster scatter plot, the top-natures bar chart and the
//! cluster-share pie chart. [`page::render_page`] embeds them in a
//! standalone HTML report.

pub mod page;

use std::collections::BTreeMap;

use incident_lens_analytics_models::AnalysisReport;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum_macros::{AsRefStr, Display, EnumString};

pub use page::{render_index, render_page};

/// Vega-Lite schema the specs are written against.
pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Title of the cluster scatter plot.
pub const SCATTER_TITLE: &str = "Incident Clusters Based on Nature";
/// Title of the top-natures bar chart.
pub const BAR_TITLE: &str = "Top 10 Incident Types";
/// Title of the cluster-share pie chart.
pub const PIE_TITLE: &str = "Distribution of Incidents Across Clusters";

const BAR_COLOR: &str = "navy";
/// x-axis label rotation, in degrees (1.2 radians).
const BAR_LABEL_ANGLE: i32 = -69;

/// Errors that can occur while rendering charts.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// A spec could not be serialised.
    #[error("Failed to serialise chart: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The three charts of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChartKind {
    /// Incidents on the 2-D projection, coloured by cluster.
    Scatter,
    /// Most frequent natures.
    Bar,
    /// Cluster shares.
    Pie,
}

/// One rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    /// Which chart this is.
    pub kind: ChartKind,
    /// Display title.
    pub title: String,
    /// Vega-Lite document.
    pub spec: Value,
}

impl ChartSpec {
    /// DOM id used when embedding the chart in a page.
    #[must_use]
    pub fn element_id(&self) -> String {
        format!("chart-{}", self.kind)
    }
}

/// All charts of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSet {
    /// Cluster scatter plot.
    pub scatter: ChartSpec,
    /// Top-natures bar chart.
    pub bar: ChartSpec,
    /// Cluster-share pie chart.
    pub pie: ChartSpec,
}

impl ChartSet {
    /// The charts in display order.
    #[must_use]
    pub const fn charts(&self) -> [&ChartSpec; 3] {
        [&self.scatter, &self.bar, &self.pie]
    }

    /// Pretty-printed JSON of the whole set.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::Serialize`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, ChartError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Renders every chart of `report`.
#[must_use]
pub fn render_charts(report: &AnalysisReport) -> ChartSet {
    ChartSet {
        scatter: scatter(report),
        bar: bar(report),
        pie: pie(report),
    }
}

fn chart(kind: ChartKind, title: &str, mut spec: Value) -> ChartSpec {
    if let Value::Object(map) = &mut spec {
        map.insert("$schema".to_owned(), json!(VEGA_LITE_SCHEMA));
        map.insert("title".to_owned(), json!(title));
    }
    ChartSpec {
        kind,
        title: title.to_owned(),
        spec,
    }
}

/// Colour scale pinning each cluster to its point colour.
fn cluster_scale(report: &AnalysisReport) -> Value {
    let colors: BTreeMap<usize, &str> = report
        .incidents
        .iter()
        .map(|i| (i.cluster, i.color.as_str()))
        .collect();
    let domain: Vec<usize> = colors.keys().copied().collect();
    let range: Vec<&str> = colors.values().copied().collect();
    json!({ "domain": domain, "range": range })
}

fn scatter(report: &AnalysisReport) -> ChartSpec {
    let values: Vec<Value> = report
        .incidents
        .iter()
        .map(|i| {
            json!({
                "Nature": i.record.nature,
                "Cluster": i.cluster,
                "x": i.x,
                "y": i.y,
            })
        })
        .collect();

    chart(
        ChartKind::Scatter,
        SCATTER_TITLE,
        json!({
            "width": 600,
            "height": 400,
            "data": { "values": values },
            "params": [{ "name": "zoom", "select": "interval", "bind": "scales" }],
            "mark": { "type": "circle", "size": 100, "opacity": 0.8 },
            "encoding": {
                "x": { "field": "x", "type": "quantitative", "title": "Component 1" },
                "y": { "field": "y", "type": "quantitative", "title": "Component 2" },
                "color": {
                    "field": "Cluster",
                    "type": "nominal",
                    "scale": cluster_scale(report),
                    "legend": { "title": "Cluster" },
                },
                "tooltip": [
                    { "field": "Nature", "type": "nominal" },
                    { "field": "Cluster", "type": "nominal" },
                ],
            },
        }),
    )
}

fn bar(report: &AnalysisReport) -> ChartSpec {
    let values: Vec<Value> = report
        .top_natures
        .iter()
        .map(|n| json!({ "Nature": n.nature, "Count": n.count }))
        .collect();
    let order: Vec<&str> = report.top_natures.iter().map(|n| n.nature.as_str()).collect();

    chart(
        ChartKind::Bar,
        BAR_TITLE,
        json!({
            "width": 600,
            "height": 400,
            "data": { "values": values },
            "mark": { "type": "bar", "color": BAR_COLOR },
            "encoding": {
                "x": {
                    "field": "Nature",
                    "type": "nominal",
                    "sort": order,
                    "axis": { "labelAngle": BAR_LABEL_ANGLE },
                },
                "y": {
                    "field": "Count",
                    "type": "quantitative",
                    "scale": { "zero": true },
                },
                "tooltip": [
                    { "field": "Nature", "type": "nominal" },
                    { "field": "Count", "type": "quantitative" },
                ],
            },
        }),
    )
}

fn pie(report: &AnalysisReport) -> ChartSpec {
    let values: Vec<Value> = report
        .cluster_shares
        .iter()
        .enumerate()
        .map(|(order, s)| {
            json!({
                "Cluster": s.cluster,
                "Count": s.count,
                "angle": s.angle,
                "order": order,
            })
        })
        .collect();
    let domain: Vec<usize> = report.cluster_shares.iter().map(|s| s.cluster).collect();
    let range: Vec<&str> = report
        .cluster_shares
        .iter()
        .map(|s| s.color.as_str())
        .collect();

    chart(
        ChartKind::Pie,
        PIE_TITLE,
        json!({
            "width": 400,
            "height": 400,
            "data": { "values": values },
            "transform": [
                { "calculate": "datum.Cluster + ': ' + datum.Count", "as": "Label" },
            ],
            "mark": { "type": "arc" },
            "encoding": {
                "theta": { "field": "angle", "type": "quantitative", "stack": true },
                "order": { "field": "order", "type": "quantitative" },
                "color": {
                    "field": "Cluster",
                    "type": "nominal",
                    "scale": { "domain": domain, "range": range },
                    "legend": { "title": "Cluster" },
                },
                "tooltip": [{ "field": "Label", "type": "nominal", "title": "Cluster" }],
            },
        }),
    )
}
