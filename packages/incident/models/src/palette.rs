//! Fixed colour palettes for cluster display.

/// Ten-colour categorical palette indexed by cluster id.
pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Twenty-colour palette in four-shade groups, used for cluster shares.
pub const CATEGORY20C: [&str; 20] = [
    "#3182bd", "#6baed6", "#9ecae1", "#c6dbef", "#e6550d", "#fd8d3c", "#fdae6b", "#fdd0a2",
    "#31a354", "#74c476", "#a1d99b", "#c7e9c0", "#756bb1", "#9e9ac8", "#bcbddc", "#dadaeb",
    "#636363", "#969696", "#bdbdbd", "#d9d9d9",
];

/// Returns the [`CATEGORY10`] colour for a cluster id, or `None` past the
/// end of the palette.
#[must_use]
pub fn cluster_color(cluster: usize) -> Option<&'static str> {
    CATEGORY10.get(cluster).copied()
}

/// Returns the first `n` colours of [`CATEGORY20C`], or `None` when `n` is
/// zero or larger than the palette.
#[must_use]
pub fn category20c(n: usize) -> Option<&'static [&'static str]> {
    if n == 0 {
        return None;
    }
    CATEGORY20C.get(..n)
}
