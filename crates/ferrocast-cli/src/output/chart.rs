//! Plain-text line charts for terminal output.

use ferrocast_core::{CombinedSeries, PriceSeries, SeriesKind};

pub const WIDTH: usize = 60;
pub const HEIGHT: usize = 12;

const HISTORICAL_MARK: char = '*';
const FORECAST_MARK: char = 'o';

/// Chart of closing prices only.
pub fn historical(prices: &PriceSeries) -> Vec<String> {
    let marks: Vec<(f64, char)> = prices
        .points()
        .iter()
        .map(|point| (point.close, HISTORICAL_MARK))
        .collect();
    plot(&marks, WIDTH, HEIGHT)
}

/// Chart of closes followed by forecasts, each drawn with its own mark.
pub fn combined(series: &CombinedSeries) -> Vec<String> {
    let marks: Vec<(f64, char)> = series
        .points()
        .iter()
        .map(|point| {
            let mark = match point.kind {
                SeriesKind::Historical => HISTORICAL_MARK,
                SeriesKind::Forecast => FORECAST_MARK,
            };
            (point.value, mark)
        })
        .collect();
    plot(&marks, WIDTH, HEIGHT)
}

/// Plots one mark per column, `height` rows tall, with a y-axis label on
/// the top and bottom rows. Longer inputs are bucketed and each column
/// shows the last value of its bucket; forecast marks win over closes.
fn plot(values: &[(f64, char)], width: usize, height: usize) -> Vec<String> {
    if values.is_empty() || width == 0 || height < 2 {
        return Vec::new();
    }

    let columns = compress(values, width);
    let (low, high) = columns
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), (value, _)| {
            (low.min(*value), high.max(*value))
        });
    let span = if high > low { high - low } else { 1.0 };

    let mut grid = vec![vec![' '; columns.len()]; height];
    for (column, (value, mark)) in columns.iter().enumerate() {
        let scaled = ((value - low) / span * (height - 1) as f64).round() as usize;
        let row = height - 1 - scaled.min(height - 1);
        grid[row][column] = *mark;
    }

    let top = format!("{high:.2}");
    let bottom = format!("{low:.2}");
    let label_width = top.len().max(bottom.len());
    grid.into_iter()
        .enumerate()
        .map(|(row, cells)| {
            let label = if row == 0 {
                top.as_str()
            } else if row == height - 1 {
                bottom.as_str()
            } else {
                ""
            };
            let line: String = cells.into_iter().collect();
            format!("{label:>label_width$} |{}", line.trim_end())
        })
        .collect()
}

fn compress(values: &[(f64, char)], width: usize) -> Vec<(f64, char)> {
    if values.len() <= width {
        return values.to_vec();
    }
    (0..width)
        .map(|column| {
            let start = column * values.len() / width;
            let end = ((column + 1) * values.len() / width).max(start + 1);
            let bucket = &values[start..end];
            let mark = if bucket.iter().any(|(_, mark)| *mark == FORECAST_MARK) {
                FORECAST_MARK
            } else {
                HISTORICAL_MARK
            };
            (bucket[bucket.len() - 1].0, mark)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_series_runs_bottom_left_to_top_right() {
        let values: Vec<(f64, char)> = (0..5).map(|i| (i as f64, HISTORICAL_MARK)).collect();
        let lines = plot(&values, 10, 5);

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("4.00 |"));
        assert!(lines[0].ends_with("    *"));
        assert!(lines[4].starts_with("0.00 |*"));
    }

    #[test]
    fn long_series_is_compressed_to_width() {
        let values: Vec<(f64, char)> = (0..500)
            .map(|i| (i as f64, if i >= 490 { FORECAST_MARK } else { HISTORICAL_MARK }))
            .collect();
        let columns = compress(&values, 50);
        assert_eq!(columns.len(), 50);
        assert_eq!(columns[49], (499.0, FORECAST_MARK));
        assert_eq!(columns[0].1, HISTORICAL_MARK);
    }

    #[test]
    fn flat_series_still_renders() {
        let lines = plot(&[(5.0, '*'), (5.0, 'o')], 10, 3);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].ends_with("*o"));
    }

    #[test]
    fn empty_series_renders_nothing() {
        assert!(plot(&[], 10, 5).is_empty());
    }
}
