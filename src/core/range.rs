const GRID_DECIMALS: i32 = 6;

fn round_to_grid(value: f64) -> f64 {
    let scale = 10_f64.powi(GRID_DECIMALS);
    (value * scale).round() / scale
}

/// Largest grid `make_range` will build.
pub const MAX_GRID_POINTS: usize = 10_000;

fn grid_shape(min: f64, max: f64, step: f64) -> (f64, f64, f64) {
    let step = if step > 0.0 { step } else { 1.0 };
    let start = if min.is_finite() { min } else { 0.0 };
    let end = if max.is_finite() { max } else { start };
    let count = ((end - start) / step).floor() + 1.0;
    (start, step, if count >= 1.0 { count } else { 0.0 })
}

/// Number of points the uncapped grid would hold. May be infinite.
pub fn grid_len(min: f64, max: f64, step: f64) -> f64 {
    grid_shape(min, max, step).2
}

/// Evenly spaced grid `min, min + step, ...` up to and including `max`,
/// truncated to [`MAX_GRID_POINTS`].
///
/// A non-positive step falls back to 1 and non-finite bounds fall back to 0
/// (or to `min` for the upper bound).
pub fn make_range(min: f64, max: f64, step: f64) -> Vec<f64> {
    let (start, step, count) = grid_shape(min, max, step);
    let count = count.min(MAX_GRID_POINTS as f64) as usize;

    (0..count)
        .map(|i| round_to_grid(start + step * i as f64))
        .collect()
}

/// Clamps `value` into `[min, max]` and moves it to the nearest grid point
/// `min + k * step`.
pub fn snap(value: f64, min: f64, max: f64, step: f64) -> f64 {
    let clamped = value.max(min).min(max);
    if step == 0.0 || step.is_nan() {
        return clamped;
    }

    let mut k = ((clamped - min) / step).round();
    let mut snapped = round_to_grid(min + k * step);
    // Rounding half a step up can overshoot a max that is not on the grid.
    if snapped > max && k > 0.0 {
        k -= 1.0;
        snapped = round_to_grid(min + k * step);
    }
    snapped
}
