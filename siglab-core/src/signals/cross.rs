//! Crossover and gap utilities.
//!
//! A cross requires strictly opposite signs of the series difference on two
//! consecutive indices; equality at either index is not a cross. NaN at any
//! of the four inspected values means the cross cannot be evaluated.

/// Direction of a crossover: `Up` means A passed from below to above B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossDirection {
    Up,
    Down,
}

/// Detect a crossover of series `a` over series `b` between `i-1` and `i`.
///
/// Returns `None` when `i == 0`, any inspected value is NaN or out of
/// bounds, or the sign of the difference did not strictly flip.
pub fn crossed(a: &[f64], b: &[f64], i: usize) -> Option<CrossDirection> {
    if i == 0 || i >= a.len() || i >= b.len() {
        return None;
    }

    let prev = a[i - 1] - b[i - 1];
    let cur = a[i] - b[i];
    if prev.is_nan() || cur.is_nan() {
        return None;
    }

    if prev < 0.0 && cur > 0.0 {
        Some(CrossDirection::Up)
    } else if prev > 0.0 && cur < 0.0 {
        Some(CrossDirection::Down)
    } else {
        None
    }
}

/// Absolute gap between two series at `i`. NaN when either value is NaN.
pub fn gap(a: &[f64], b: &[f64], i: usize) -> f64 {
    match (a.get(i), b.get(i)) {
        (Some(&x), Some(&y)) => (x - y).abs(),
        _ => f64::NAN,
    }
}

/// Deferred gap validation: the gap at `i` meets `threshold`, or it does at
/// some index in `i+1 ..= min(i + window, limit)`.
///
/// `limit` is the last closed index of the evaluated series and is never
/// exceeded, so the scan cannot consume the forming candle or any data
/// beyond what is actually available — offline batch and rolling-window
/// evaluation share the same bound.
///
/// Returns the number of bars after `i` at which the gap first reached the
/// threshold (0 when it was wide enough immediately), or `None`.
pub fn gap_valid_within(
    a: &[f64],
    b: &[f64],
    i: usize,
    threshold: f64,
    window: usize,
    limit: usize,
) -> Option<usize> {
    let end = (i + window).min(limit);
    for j in i..=end {
        let g = gap(a, b, j);
        if !g.is_nan() && g >= threshold {
            return Some(j - i);
        }
    }
    None
}
