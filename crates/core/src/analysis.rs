//! Engagement vs. sentiment: Pearson correlation matrix and scatter plot.

use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::{
    csv_io::Table,
    error::{Result, VidmoodError},
};

pub const CORRELATION_COLUMNS: [&str; 7] =
    ["views", "likes", "comments", "neg", "neu", "pos", "compound"];

pub const PLOT_TITLE: &str = "Compound Sentiment Score vs. Views";

/// Square matrix; `None` where the coefficient is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Pearson coefficient of paired samples. Needs two points and non-zero
/// variance on both sides.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Rows where both cells parse as numbers.
fn complete_pairs(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<(f64, f64)> {
    a.iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect()
}

/// Pairwise-complete Pearson matrix over `columns`.
pub fn correlation_matrix(table: &Table, columns: &[&str]) -> Result<CorrelationMatrix> {
    let data = columns
        .iter()
        .map(|name| table.numeric_column(name))
        .collect::<Result<Vec<_>>>()?;

    let values = data
        .iter()
        .map(|a| {
            data.iter()
                .map(|b| pearson(&complete_pairs(a, b)))
                .collect()
        })
        .collect();

    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

/// `(views, compound)` points for the scatter plot.
pub fn views_vs_compound(table: &Table) -> Result<Vec<(f64, f64)>> {
    Ok(complete_pairs(
        &table.numeric_column("views")?,
        &table.numeric_column("compound")?,
    ))
}

/// Render Views (x) against compound sentiment (y) as an SVG file.
pub fn scatter_plot(points: &[(f64, f64)], path: &Path) -> Result<()> {
    let plot_failed = |e: &dyn std::fmt::Display| VidmoodError::PlotFailed {
        reason: e.to_string(),
    };
    if points.is_empty() {
        return Err(plot_failed(&"no rows with both views and compound"));
    }

    let max_views = points.iter().map(|p| p.0).fold(0.0_f64, f64::max).max(1.0);
    let root = SVGBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| plot_failed(&e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(PLOT_TITLE, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..max_views * 1.05, -1.05..1.05)
        .map_err(|e| plot_failed(&e))?;

    chart
        .configure_mesh()
        .x_desc("Views")
        .y_desc("Compound Sentiment Score")
        .x_label_formatter(&|v| crate::format::format_view_count(*v as u64))
        .draw()
        .map_err(|e| plot_failed(&e))?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.6).filled())),
        )
        .map_err(|e| plot_failed(&e))?;

    root.present().map_err(|e| plot_failed(&e))?;
    info!("scatter plot written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(contents: &str) -> (tempfile::TempDir, Table) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, contents).unwrap();
        let table = Table::read(&path).unwrap();
        (dir, table)
    }

    #[test]
    fn pearson_matches_known_values() {
        let perfect = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        assert!((pearson(&perfect).unwrap() - 1.0).abs() < 1e-12);

        let inverse = [(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)];
        assert!((pearson(&inverse).unwrap() + 1.0).abs() < 1e-12);

        let mixed = [(1.0, 2.0), (2.0, 1.0), (3.0, 4.0), (4.0, 3.0)];
        assert!((pearson(&mixed).unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_undefined() {
        assert_eq!(pearson(&[(1.0, 1.0)]), None);
        assert_eq!(pearson(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)]), None);
    }

    #[test]
    fn matrix_uses_pairwise_complete_rows() {
        let (_dir, t) = table("views,compound,neg\n1,0.1,0.3\n2,0.2,\n3,,0.1\n4,0.4,0.0\n");
        let m = correlation_matrix(&t, &["views", "compound", "neg"]).unwrap();

        assert!((m.get("views", "views").unwrap() - 1.0).abs() < 1e-12);
        // rows 1, 2 and 4 only
        let expected = pearson(&[(1.0, 0.1), (2.0, 0.2), (4.0, 0.4)]).unwrap();
        assert!((m.get("views", "compound").unwrap() - expected).abs() < 1e-12);
        // rows 1 and 4 only
        assert!((m.get("compound", "neg").unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(m.get("neg", "views"), m.get("views", "neg"));
    }

    #[test]
    fn missing_column_aborts() {
        let (_dir, t) = table("views\n1\n");
        assert!(matches!(
            correlation_matrix(&t, &CORRELATION_COLUMNS),
            Err(VidmoodError::MissingColumn { .. })
        ));
    }

    #[test]
    fn scatter_plot_writes_svg() {
        let (dir, t) = table("views,compound\n100,0.5\n2500000,-0.25\n,0.3\n");
        let points = views_vs_compound(&t).unwrap();
        assert_eq!(points.len(), 2);

        let out = dir.path().join("plot.svg");
        scatter_plot(&points, &out).unwrap();
        let svg = std::fs::read_to_string(out).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(PLOT_TITLE));
    }

    #[test]
    fn empty_plot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            scatter_plot(&[], &dir.path().join("plot.svg")),
            Err(VidmoodError::PlotFailed { .. })
        ));
    }
}
