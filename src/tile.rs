use serde::{Deserialize, Serialize};

/// World units (subcells) per tile along each axis
pub const TILE_SIZE: f64 = 5.0;

/// Subcell coordinates start at 1 rather than 0
pub const SUBCELL_ORIGIN: f64 = 1.0;

/// A tile the entity should pass through
///
/// Waypoints are plain tile indices; whatever search produced them is not
/// the kernel's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: i32,
    pub y: i32,
}

impl Waypoint {
    pub fn new(x: i32, y: i32) -> Self {
        Waypoint { x, y }
    }

    /// World coordinates of the tile origin
    pub fn to_world(self) -> (f64, f64) {
        (f64::from(self.x) * TILE_SIZE, f64::from(self.y) * TILE_SIZE)
    }
}

impl From<(i32, i32)> for Waypoint {
    fn from((x, y): (i32, i32)) -> Self {
        Waypoint::new(x, y)
    }
}

/// Tile index containing a world coordinate
pub fn tile_of(world: f64) -> i32 {
    (world / TILE_SIZE).floor() as i32
}

/// Offset of a world coordinate inside its tile, in `[1, TILE_SIZE + 1)`
pub fn subcell_of(world: f64) -> f64 {
    SUBCELL_ORIGIN + world.rem_euclid(TILE_SIZE)
}

/// Tiles on a straight 8-connected line from `from` (exclusive) to `to` (inclusive).
///
/// Obstacles are not considered. Uses integer error stepping so every
/// consecutive pair of tiles differs by at most one on each axis.
pub fn line_waypoints(from: Waypoint, to: Waypoint) -> Vec<Waypoint> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let step_x = if from.x < to.x { 1 } else { -1 };
    let step_y = if from.y < to.y { 1 } else { -1 };

    let mut waypoints = Vec::with_capacity(dx.max(-dy) as usize);
    let mut x = from.x;
    let mut y = from.y;
    let mut error = dx + dy;

    while x != to.x || y != to.y {
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
        waypoints.push(Waypoint::new(x, y));
    }

    waypoints
}
