//! Terminal charts.
//!
//! Every chart is drawn onto a character grid with a labelled y axis and
//! returned as a string, so callers decide where it goes.

use factorfit_regression::gaussian_kde;

/// Plot area in characters, excluding axes and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 64,
            height: 16,
        }
    }
}

impl ChartSize {
    /// Size for small multiples.
    pub const fn panel() -> Self {
        Self {
            width: 22,
            height: 8,
        }
    }
}

const LABEL_WIDTH: usize = 9;
const PAIR_HISTOGRAM_BINS: usize = 10;

/// Finite min and max, widened when degenerate.
fn bounds<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return None;
    }
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return Some((lo - pad, hi + pad));
    }
    Some((lo, hi))
}

struct Canvas {
    size: ChartSize,
    cells: Vec<Vec<char>>,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Canvas {
    fn new(size: ChartSize, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        let size = ChartSize {
            width: size.width.max(2),
            height: size.height.max(2),
        };
        Self {
            size,
            cells: vec![vec![' '; size.width]; size.height],
            x_range,
            y_range,
        }
    }

    fn col(&self, x: f64) -> Option<usize> {
        let (lo, hi) = self.x_range;
        let t = (x - lo) / (hi - lo);
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some((t * (self.size.width - 1) as f64).round() as usize)
    }

    fn row(&self, y: f64) -> Option<usize> {
        let (lo, hi) = self.y_range;
        let t = (y - lo) / (hi - lo);
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(self.size.height - 1 - (t * (self.size.height - 1) as f64).round() as usize)
    }

    fn plot(&mut self, x: f64, y: f64, ch: char) {
        if let (Some(c), Some(r)) = (self.col(x), self.row(y)) {
            self.cells[r][c] = ch;
        }
    }

    fn hline(&mut self, y: f64, ch: char) {
        if let Some(r) = self.row(y) {
            for cell in &mut self.cells[r] {
                *cell = ch;
            }
        }
    }

    fn vbar(&mut self, col: usize, top: f64, ch: char) {
        if let Some(r) = self.row(top) {
            for row in r..self.size.height {
                self.cells[row][col] = ch;
            }
        }
    }

    fn render(&self, title: &str, x_labels: (String, String)) -> String {
        let mut output = String::new();
        output.push_str(title);
        output.push('\n');

        let (y_lo, y_hi) = self.y_range;
        let mid = self.size.height / 2;
        for (r, row) in self.cells.iter().enumerate() {
            let label = if r == 0 {
                format!("{:>w$.4}", y_hi, w = LABEL_WIDTH)
            } else if r == self.size.height - 1 {
                format!("{:>w$.4}", y_lo, w = LABEL_WIDTH)
            } else if r == mid {
                format!("{:>w$.4}", (y_hi + y_lo) / 2.0, w = LABEL_WIDTH)
            } else {
                " ".repeat(LABEL_WIDTH)
            };
            output.push_str(&label);
            output.push_str(" |");
            output.extend(row.iter());
            output.push('\n');
        }

        output.push_str(&" ".repeat(LABEL_WIDTH + 1));
        output.push('+');
        output.push_str(&"-".repeat(self.size.width));
        output.push('\n');

        let gap = (self.size.width + 1).saturating_sub(x_labels.0.len() + x_labels.1.len());
        output.push_str(&" ".repeat(LABEL_WIDTH + 2));
        output.push_str(&x_labels.0);
        output.push_str(&" ".repeat(gap.max(1)));
        output.push_str(&x_labels.1);
        output.push('\n');
        output
    }
}

fn empty_chart(title: &str) -> String {
    format!("{}\n  (no data)\n", title)
}

/// Line chart of a series against its index, optionally with a dashed zero line.
pub fn line_chart(
    title: &str,
    values: &[f64],
    x_labels: (&str, &str),
    zero_line: bool,
    size: ChartSize,
) -> String {
    let Some((mut lo, mut hi)) = bounds(values) else {
        return empty_chart(title);
    };
    if zero_line {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }

    let last = values.len().saturating_sub(1).max(1) as f64;
    let mut canvas = Canvas::new(size, (0.0, last), (lo, hi));
    if zero_line {
        canvas.hline(0.0, '-');
    }

    // Interpolate between consecutive points so the line stays connected
    let steps = (canvas.size.width / values.len().max(1)).max(1);
    for (i, pair) in values.windows(2).enumerate() {
        if !(pair[0].is_finite() && pair[1].is_finite()) {
            continue;
        }
        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            canvas.plot(i as f64 + t, pair[0] + (pair[1] - pair[0]) * t, '.');
        }
    }
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            canvas.plot(i as f64, v, '*');
        }
    }

    canvas.render(title, (x_labels.0.to_string(), x_labels.1.to_string()))
}

/// Scatter plot of paired observations; pairs with a missing side are skipped.
pub fn scatter_plot(title: &str, x: &[f64], y: &[f64], size: ChartSize) -> String {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    let (Some(x_range), Some(y_range)) = (
        bounds(pairs.iter().map(|p| &p.0)),
        bounds(pairs.iter().map(|p| &p.1)),
    ) else {
        return empty_chart(title);
    };

    let mut canvas = Canvas::new(size, x_range, y_range);
    for &(a, b) in &pairs {
        let hit = matches!(
            (canvas.col(a), canvas.row(b)),
            (Some(c), Some(r)) if canvas.cells[r][c] != ' '
        );
        canvas.plot(a, b, if hit { '@' } else { 'o' });
    }

    canvas.render(
        title,
        (format!("{:.3}", x_range.0), format!("{:.3}", x_range.1)),
    )
}

/// Histogram scaled as a density, with a Gaussian KDE curve drawn over the bars.
pub fn histogram_with_density(title: &str, values: &[f64], bins: usize, size: ChartSize) -> String {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some((lo, hi)) = bounds(&finite) else {
        return empty_chart(title);
    };
    let bins = bins.max(1);
    let bin_width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in &finite {
        let idx = (((v - lo) / bin_width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let n = finite.len() as f64;
    let heights: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 / (n * bin_width))
        .collect();

    let size = ChartSize {
        width: size.width.max(bins),
        height: size.height,
    };
    let centers: Vec<f64> = (0..size.width)
        .map(|c| lo + (c as f64 + 0.5) * (hi - lo) / size.width as f64)
        .collect();
    let density = gaussian_kde(&finite, &centers);

    let top = heights
        .iter()
        .chain(density.iter().flatten())
        .fold(0.0f64, |m, &v| m.max(v));
    let mut canvas = Canvas::new(size, (lo, hi), (0.0, if top > 0.0 { top } else { 1.0 }));

    for col in 0..canvas.size.width {
        let bin = ((col * bins) / canvas.size.width).min(bins - 1);
        if counts[bin] > 0 {
            canvas.vbar(col, heights[bin], '#');
        }
    }
    if let Some(density) = density {
        for (&x, &d) in centers.iter().zip(&density) {
            canvas.plot(x, d, '*');
        }
    }

    canvas.render(title, (format!("{:.3}", lo), format!("{:.3}", hi)))
}

/// Place multi-line blocks side by side.
fn side_by_side(blocks: &[String], gap: usize) -> String {
    let split: Vec<Vec<&str>> = blocks.iter().map(|b| b.lines().collect()).collect();
    let widths: Vec<usize> = split
        .iter()
        .map(|lines| lines.iter().map(|l| l.chars().count()).max().unwrap_or(0))
        .collect();
    let rows = split.iter().map(Vec::len).max().unwrap_or(0);

    let mut output = String::new();
    for r in 0..rows {
        let line = split
            .iter()
            .zip(&widths)
            .map(|(lines, &w)| format!("{:<w$}", lines.get(r).copied().unwrap_or(""), w = w))
            .collect::<Vec<_>>()
            .join(&" ".repeat(gap));
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output
}

/// Lower-triangle pair grid over `columns`.
///
/// Row `i` holds the scatter plots of column `i` against every earlier column,
/// followed by the distribution of column `i` itself. Rows wider than
/// `per_row` panels wrap.
pub fn pair_plot(
    title: &str,
    columns: &[(&str, &[f64])],
    per_row: usize,
    size: ChartSize,
) -> String {
    let mut output = format!("{title}\n\n");
    for (i, &(y_name, y)) in columns.iter().enumerate() {
        let mut panels: Vec<String> = columns[..i]
            .iter()
            .map(|&(x_name, x)| scatter_plot(&format!("{y_name} vs {x_name}"), x, y, size))
            .collect();
        panels.push(histogram_with_density(y_name, y, PAIR_HISTOGRAM_BINS, size));

        let rows: Vec<String> = panels
            .chunks(per_row.max(1))
            .map(|row| side_by_side(row, 3))
            .collect();
        output.push_str(&rows.join("\n"));
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn series(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.5).sin() * 0.05).collect()
    }

    #[test]
    fn test_line_chart_with_zero_line() {
        let chart = line_chart("Residuals", &series(40), ("2020-01", "2023-04"), true, ChartSize::default());
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "Residuals");
        assert!(chart.contains("2020-01"));
        assert!(chart.contains("2023-04"));
        assert!(chart.contains('*'));
        // Plot rows plus title, axis and labels
        assert_eq!(lines.len(), ChartSize::default().height + 3);
        assert!(lines.iter().any(|l| l.contains("----") && l.contains('|')));
    }

    #[test]
    fn test_scatter_plot_extremes() {
        let x = [0.0, 1.0, 2.0, f64::NAN];
        let y = [0.0, 1.0, 4.0, 9.0];
        let chart = scatter_plot("y vs x", &x, &y, ChartSize { width: 10, height: 5 });
        let rows: Vec<&str> = chart.lines().skip(1).take(5).collect();
        // Largest y lands in the top row at the right edge
        assert!(rows[0].ends_with('o'));
        // Smallest y lands in the bottom row at the left edge
        assert!(rows[4].contains("|o"));
        assert!(chart.contains("0.000"));
        assert!(chart.contains("2.000"));
    }

    #[test]
    fn test_histogram_has_bars_and_density() {
        let chart = histogram_with_density("Distribution", &series(120), 12, ChartSize::default());
        assert!(chart.starts_with("Distribution"));
        assert!(chart.contains('#'));
        assert!(chart.contains('*'));
    }

    #[rstest]
    #[case(&[])]
    #[case(&[f64::NAN, f64::NAN])]
    fn test_empty_input(#[case] values: &[f64]) {
        assert!(line_chart("t", values, ("", ""), true, ChartSize::default()).contains("no data"));
        assert!(histogram_with_density("t", values, 10, ChartSize::default()).contains("no data"));
    }

    #[test]
    fn test_constant_series_does_not_panic() {
        let chart = line_chart("flat", &[0.02; 10], ("a", "b"), false, ChartSize::default());
        assert!(chart.contains('*'));
        let hist = histogram_with_density("flat", &[0.02; 10], 5, ChartSize::default());
        assert!(hist.contains('#'));
    }

    #[test]
    fn test_pair_plot_lower_triangle() {
        let target = series(30);
        let a: Vec<f64> = target.iter().map(|v| v * 2.0).collect();
        let b: Vec<f64> = target.iter().map(|v| -v).collect();
        let plot = pair_plot(
            "Pairplot",
            &[("Mkt-RF", a.as_slice()), ("SMB", b.as_slice()), ("stock_return", target.as_slice())],
            2,
            ChartSize::panel(),
        );
        assert!(plot.starts_with("Pairplot"));
        assert!(plot.contains("SMB vs Mkt-RF"));
        assert!(plot.contains("stock_return vs Mkt-RF"));
        assert!(plot.contains("stock_return vs SMB"));
        // Upper triangle is not drawn
        assert!(!plot.contains("Mkt-RF vs SMB"));
        // One scatter per pair, one histogram per column
        assert_eq!(plot.matches(" vs ").count(), 3);
        assert!(plot.contains('#'));
        // The last row has three panels and wraps after two
        let last_row_titles: Vec<&str> = plot
            .lines()
            .filter(|l| l.starts_with("stock_return"))
            .collect();
        assert_eq!(last_row_titles.len(), 2);
        assert!(last_row_titles[0].contains("stock_return vs SMB"));
    }
}
