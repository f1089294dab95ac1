/// Per-axis distance under which an entity counts as sitting on its target
pub const FINE_TOLERANCE: f64 = 0.0001;

/// Per-axis distance under which a leg is finished and the next waypoint is pulled
pub const COARSE_TOLERANCE: f64 = 0.01;

/// Adjustments smaller than this are treated as no movement at all
pub const MOVE_EPSILON: f64 = 0.000001;

/// True if `a` and `b` differ by at most `tolerance`
pub fn almost_equal(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Move `source` by `adjustment` toward `target`, clamping at the target.
///
/// Returns the new value and the overshoot that was cut off by the clamp
/// (signed like `adjustment`, zero when nothing was clamped). A step that
/// points away from the target is applied as-is and never clamps.
pub fn adjust_with_remainder(source: f64, adjustment: f64, target: f64) -> (f64, f64) {
    if adjustment.abs() < MOVE_EPSILON {
        return (source, 0.0);
    }

    let moved = source + adjustment;

    if adjustment > 0.0 && source <= target && moved > target {
        return (target, moved - target);
    }
    if adjustment < 0.0 && source >= target && moved < target {
        return (target, moved - target);
    }

    (moved, 0.0)
}
