/// Number of discrete facings an entity can be drawn with
pub const DIRECTION_COUNT: usize = 64;

const DEGREES_PER_DIRECTION: f64 = 360.0 / DIRECTION_COUNT as f64;

/// Direction 0 is centred on 45 degrees
const DIRECTION_OFFSET: f64 = 45.0 - DEGREES_PER_DIRECTION / 2.0;

/// Whole-degree angle from `(x1, y1)` to `(x2, y2)` in `[0, 360)`.
///
/// 0 points along +x and angles grow counter-clockwise on screen (y grows
/// downward, so the y delta is flipped). Fractional degrees are truncated.
pub fn angle_between(x1: f64, y1: f64, x2: f64, y2: f64) -> i32 {
    let delta_y = y1 - y2;
    let delta_x = x2 - x1;

    let degrees = delta_y.atan2(delta_x).to_degrees() as i32;

    degrees.rem_euclid(360)
}

/// Bearing used for both stepping and facing: `359 - angle_between`
pub fn bearing(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    f64::from(359 - angle_between(x1, y1, x2, y2))
}

/// Map a bearing in degrees onto one of the [`DIRECTION_COUNT`] facings.
///
/// Inputs more than one turn outside `[offset, offset + 360)` are not
/// normalised; bearings produced by [`bearing`] always land inside.
pub fn angle_to_direction(angle: f64) -> usize {
    let count = DIRECTION_COUNT as i64;
    let mut direction = ((angle - DIRECTION_OFFSET) / DEGREES_PER_DIRECTION).floor() as i64;

    if direction >= count {
        direction -= count;
    } else if direction < 0 {
        direction += count;
    }

    direction as usize
}
