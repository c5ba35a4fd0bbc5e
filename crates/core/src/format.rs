use crate::{analysis::CorrelationMatrix, config::Tier};

const VIEW_UNITS: [(f64, &str); 3] = [(1e3, "K"), (1e6, "M"), (1e9, "B")];

/// Compact view count: 950, 12.3K, 4.5M, 1.2B.
pub fn format_view_count(views: u64) -> String {
    if views < 1_000 {
        return views.to_string();
    }
    let views = views as f64;
    let tenths = |scale: f64| (views / scale * 10.0).round();
    // the unit is picked after rounding, so 999_950 reads 1.0M rather than 1000.0K
    let (scale, unit) = VIEW_UNITS
        .iter()
        .copied()
        .find(|&(scale, _)| tenths(scale) < 10_000.0)
        .unwrap_or(VIEW_UNITS[2]);
    format!("{:.1}{unit}", tenths(scale) / 10.0)
}

/// Half-open range notation, e.g. `[10000, 100000)` or `[1000000, ∞)`.
pub fn format_tier_range(tier: &Tier) -> String {
    let upper = tier
        .max_views
        .map_or_else(|| "∞".to_string(), |max| max.to_string());
    format!("[{}, {})", tier.min_views, upper)
}

/// Matrix as an aligned text table, coefficients rounded to 3 decimals.
/// Undefined coefficients print as `NaN`.
pub fn format_correlation_matrix(matrix: &CorrelationMatrix) -> String {
    let width = matrix
        .columns
        .iter()
        .map(|c| c.len())
        .max()
        .unwrap_or(0)
        .max(6);

    let mut output = format!("{:width$}", "");
    for name in &matrix.columns {
        output.push_str(&format!(" {name:>width$}"));
    }
    output.push('\n');

    for (name, row) in matrix.columns.iter().zip(&matrix.values) {
        output.push_str(&format!("{name:<width$}"));
        for value in row {
            let cell = match value {
                Some(v) => format!("{:.3}", v),
                None => "NaN".to_string(),
            };
            output.push_str(&format!(" {cell:>width$}"));
        }
        output.push('\n');
    }
    output
}
