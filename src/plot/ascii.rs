//! ASCII plotting of folded light curves.
//!
//! Fixed-size character grid, optimized for:
//! - quick visual sanity checks of a fold in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - phase-binned mean flux: `-` line

use crate::domain::OutputCurve;
use crate::io::curve::SavedCurve;

/// Render an in-memory folded curve.
pub fn render_output_curve(name: &str, curve: &OutputCurve, width: usize, height: usize) -> String {
    let points: Vec<(f64, f64)> = curve
        .samples
        .iter()
        .map(|s| (s.phase, s.normalized_flux))
        .collect();
    let title = format!(
        "{name} | P={:.6} d | E0={:.6} ({})",
        curve.period,
        curve.epoch.value,
        curve.epoch.source.label()
    );
    render_phase_plot(&title, &points, width, height, true)
}

/// Render a curve CSV read back from disk.
pub fn render_saved_curve(curve: &SavedCurve, width: usize, height: usize) -> String {
    let name = curve.object.as_deref().unwrap_or("curve");
    let source = curve.epoch_source.map(|s| s.label()).unwrap_or("unknown");
    let title = format!(
        "{name} | P={:.6} d | E0={:.6} ({source})",
        curve.period, curve.epoch0
    );
    render_phase_plot(&title, &curve.points, width, height, true)
}

/// Render `(phase, flux)` points over phase `[0, 1]`.
pub fn render_phase_plot(
    title: &str,
    points: &[(f64, f64)],
    width: usize,
    height: usize,
    with_trend: bool,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    if with_trend {
        let trend = binned_mean(points, width);
        draw_curve(&mut grid, &trend, y_min, y_max);
    }

    for &(phase, y) in points {
        if !(phase.is_finite() && y.is_finite()) {
            continue;
        }
        let x = map_x(phase, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {title} | phase=[0, 1] | flux=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Mean flux per phase bin, at bin centers. Empty bins are omitted.
pub fn binned_mean(points: &[(f64, f64)], bins: usize) -> Vec<(f64, f64)> {
    let bins = bins.max(1);
    let mut sums = vec![0.0; bins];
    let mut counts = vec![0usize; bins];
    for &(phase, y) in points {
        if !(phase.is_finite() && y.is_finite()) {
            continue;
        }
        let idx = ((phase.clamp(0.0, 1.0) * bins as f64) as usize).min(bins - 1);
        sums[idx] += y;
        counts[idx] += 1;
    }
    (0..bins)
        .filter(|&i| counts[i] > 0)
        .map(|i| ((i as f64 + 0.5) / bins as f64, sums[i] / counts[i] as f64))
        .collect()
}

fn y_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(phase: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = phase.clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(phase, y) in curve {
        let x = map_x(phase, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
