use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::direction::{angle_to_direction, bearing};
use crate::numeric::{adjust_with_remainder, almost_equal, COARSE_TOLERANCE, FINE_TOLERANCE, MOVE_EPSILON};
use crate::tile::{subcell_of, tile_of, Waypoint, TILE_SIZE};

/// World units per second a freshly created entity moves at
pub const DEFAULT_SPEED: f64 = 6.0;

/// Upper bound on inner passes spent on a single leg within one tick
const PASSES_PER_LEG: usize = 3;

/// One-shot completion callback
pub type ArriveFn = Box<dyn FnOnce()>;

/// Facing selector, receives a direction index in `[0, DIRECTION_COUNT)`
pub type DirectionFn = Box<dyn FnMut(usize)>;

/// What happened during a single [`MotionKernel::step`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    /// Waypoints pulled off the queue this tick
    pub waypoints_consumed: usize,
    /// Entity is sitting on its final target after this tick
    pub arrived: bool,
    /// The completion callback was invoked this tick
    pub completed: bool,
    /// Inner passes the integrator ran
    pub iterations: usize,
    /// The integrator stopped early because it ran out of passes
    pub hit_iteration_cap: bool,
}

/// Motion state of one entity on the tile grid
///
/// The continuous world position is authoritative; tile and subcell
/// coordinates are caches refreshed whenever the position moves.
pub struct MotionKernel {
    x: f64,
    y: f64,

    tile_x: i32,
    tile_y: i32,
    subcell_x: f64,
    subcell_y: f64,

    target_x: f64,
    target_y: f64,

    speed: f64,

    /// Legs after the current target
    path: VecDeque<Waypoint>,

    /// Draw layer, carried for the owner
    layer: i32,

    on_arrive: Option<ArriveFn>,
    on_direction_change: Option<DirectionFn>,
}

impl MotionKernel {
    /// Create a resting entity at world coordinates `(x, y)`
    pub fn new(x: f64, y: f64) -> Self {
        MotionKernel {
            x,
            y,
            tile_x: tile_of(x),
            tile_y: tile_of(y),
            subcell_x: subcell_of(x),
            subcell_y: subcell_of(y),
            target_x: x,
            target_y: y,
            speed: DEFAULT_SPEED,
            path: VecDeque::new(),
            layer: 0,
            on_arrive: None,
            on_direction_change: None,
        }
    }

    /// Create a resting entity on the origin of tile `(tile_x, tile_y)`
    pub fn at_tile(tile_x: i32, tile_y: i32) -> Self {
        let (x, y) = Waypoint::new(tile_x, tile_y).to_world();
        Self::new(x, y)
    }

    /// Replace the remaining route and the completion callback.
    ///
    /// The current target is left alone; set the first leg with
    /// [`set_target`](Self::set_target).
    pub fn set_path<I>(&mut self, path: I, on_arrive: Option<ArriveFn>)
    where
        I: IntoIterator<Item = Waypoint>,
    {
        self.path = path.into_iter().collect();
        self.on_arrive = on_arrive;
        debug!(legs = self.path.len(), "path set");
    }

    /// Drop every remaining waypoint; the current leg still runs to its end
    pub fn clear_path(&mut self) {
        self.path.clear();
    }

    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    pub fn path(&self) -> &VecDeque<Waypoint> {
        &self.path
    }

    /// Set the speed used by [`step`](Self::step). Zero or negative values are accepted.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    /// Register the facing selector invoked by every [`set_target`](Self::set_target)
    pub fn set_direction_handler(&mut self, handler: impl FnMut(usize) + 'static) {
        self.on_direction_change = Some(Box::new(handler));
    }

    pub fn clear_direction_handler(&mut self) {
        self.on_direction_change = None;
    }

    /// Point the entity at a new immediate target and replace the completion callback.
    ///
    /// The direction handler, if any, is told which of the 64 facings points
    /// from the current position to the new target.
    pub fn set_target(&mut self, target_x: f64, target_y: f64, on_arrive: Option<ArriveFn>) {
        self.target_x = target_x;
        self.target_y = target_y;
        self.on_arrive = on_arrive;

        if let Some(handler) = self.on_direction_change.as_mut() {
            let angle = bearing(self.x, self.y, target_x, target_y);
            handler(angle_to_direction(angle));
        }
    }

    pub fn target(&self) -> (f64, f64) {
        (self.target_x, self.target_y)
    }

    /// True when both axes sit on the target and no legs remain
    pub fn is_at_target(&self) -> bool {
        almost_equal(self.x, self.target_x, FINE_TOLERANCE)
            && almost_equal(self.y, self.target_y, FINE_TOLERANCE)
            && !self.has_path()
    }

    /// Advance the entity by one tick of `tick` seconds.
    ///
    /// A fast entity may finish several legs in one tick; the step budget
    /// left over after reaching a leg's end is spent on the next leg.
    pub fn step(&mut self, tick: f64) -> StepOutcome {
        let mut outcome = StepOutcome::default();

        if self.is_at_target() {
            outcome.arrived = true;
            outcome.completed = self.fire_arrival();
            return outcome;
        }

        let max_iterations = PASSES_PER_LEG * (self.path.len() + 1);
        let mut budget = self.speed * tick;

        loop {
            if outcome.iterations == max_iterations {
                warn!(
                    x = self.x,
                    y = self.y,
                    target_x = self.target_x,
                    target_y = self.target_y,
                    "step iteration cap reached"
                );
                outcome.hit_iteration_cap = true;
                break;
            }
            outcome.iterations += 1;

            let (mut step_x, mut step_y) = self.step_vector(budget);

            if almost_equal(self.x, self.target_x, FINE_TOLERANCE) {
                step_x = 0.0;
            }
            if almost_equal(self.y, self.target_y, FINE_TOLERANCE) {
                step_y = 0.0;
            }

            let (start_x, start_y) = (self.x, self.y);
            let (new_x, rest_x) = adjust_with_remainder(self.x, step_x, self.target_x);
            let (new_y, rest_y) = adjust_with_remainder(self.y, step_y, self.target_y);
            self.x = new_x;
            self.y = new_y;
            self.refresh_cells();

            let clamped = rest_x != 0.0 || rest_y != 0.0;
            let leg_done = almost_equal(self.x, self.target_x, COARSE_TOLERANCE)
                && almost_equal(self.y, self.target_y, COARSE_TOLERANCE);

            if leg_done {
                match self.path.pop_front() {
                    Some(waypoint) => {
                        let (next_x, next_y) = waypoint.to_world();
                        let on_arrive = self.on_arrive.take();
                        self.set_target(next_x, next_y, on_arrive);
                        outcome.waypoints_consumed += 1;
                        debug!(
                            tile_x = waypoint.x,
                            tile_y = waypoint.y,
                            remaining = self.path.len(),
                            "advanced to next waypoint"
                        );
                    }
                    None => {
                        self.x = self.target_x;
                        self.y = self.target_y;
                        self.refresh_cells();
                        break;
                    }
                }
            } else if !clamped {
                break;
            }

            let travelled = (self.x - start_x).hypot(self.y - start_y);
            let remaining = budget.abs() - travelled;
            if remaining < MOVE_EPSILON {
                break;
            }
            budget = remaining.copysign(budget);
        }

        trace!(
            x = self.x,
            y = self.y,
            iterations = outcome.iterations,
            consumed = outcome.waypoints_consumed,
            "stepped"
        );

        if self.is_at_target() {
            outcome.arrived = true;
            outcome.completed = self.fire_arrival();
        }

        outcome
    }

    /// Current tile coordinates
    pub fn position(&self) -> (i32, i32) {
        (self.tile_x, self.tile_y)
    }

    /// Tile coordinates with the subcell folded in as a fraction
    pub fn position_f(&self) -> (f64, f64) {
        (
            f64::from(self.tile_x) + self.subcell_x / TILE_SIZE,
            f64::from(self.tile_y) + self.subcell_y / TILE_SIZE,
        )
    }

    pub fn world_position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn subcell(&self) -> (f64, f64) {
        (self.subcell_x, self.subcell_y)
    }

    fn step_vector(&self, length: f64) -> (f64, f64) {
        let radians = bearing(self.x, self.y, self.target_x, self.target_y).to_radians();
        (length * radians.cos(), length * radians.sin())
    }

    fn refresh_cells(&mut self) {
        self.tile_x = tile_of(self.x);
        self.tile_y = tile_of(self.y);
        self.subcell_x = subcell_of(self.x);
        self.subcell_y = subcell_of(self.y);
    }

    fn fire_arrival(&mut self) -> bool {
        match self.on_arrive.take() {
            Some(done) => {
                debug!(x = self.x, y = self.y, "arrived");
                done();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for MotionKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionKernel")
            .field("position", &(self.x, self.y))
            .field("tile", &(self.tile_x, self.tile_y))
            .field("subcell", &(self.subcell_x, self.subcell_y))
            .field("target", &(self.target_x, self.target_y))
            .field("speed", &self.speed)
            .field("path", &self.path)
            .field("layer", &self.layer)
            .field("on_arrive", &self.on_arrive.is_some())
            .field("on_direction_change", &self.on_direction_change.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_new_entity_rests_on_its_target() {
        let entity = MotionKernel::new(12.5, 7.0);
        assert_eq!(entity.target(), (12.5, 7.0));
        assert_eq!(entity.position(), (2, 1));
        assert_eq!(entity.subcell(), (3.5, 3.0));
        assert_eq!(entity.speed(), DEFAULT_SPEED);
        assert_eq!(entity.layer(), 0);
        assert!(entity.is_at_target());
        assert!(!entity.has_path());
    }

    #[test]
    fn test_at_tile_uses_tile_origin() {
        let entity = MotionKernel::at_tile(4, 2);
        assert_eq!(entity.world_position(), (20.0, 10.0));
        assert_eq!(entity.position(), (4, 2));
        assert_eq!(entity.subcell(), (1.0, 1.0));
    }

    #[test]
    fn test_pending_path_means_not_at_target() {
        let mut entity = MotionKernel::new(0.0, 0.0);
        entity.set_path(vec![Waypoint::new(1, 0)], None);
        assert!(entity.has_path());
        assert!(!entity.is_at_target());

        entity.clear_path();
        assert!(entity.is_at_target());
    }

    #[test]
    fn test_at_target_within_fine_tolerance() {
        let mut entity = MotionKernel::new(10.0, 10.0);
        entity.set_target(10.00009, 9.99991, None);
        assert!(entity.is_at_target());

        entity.set_target(10.001, 10.0, None);
        assert!(!entity.is_at_target());
    }

    #[test]
    fn test_set_target_reports_direction() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut entity = MotionKernel::new(0.0, 0.0);
        let sink = Rc::clone(&seen);
        entity.set_direction_handler(move |direction| sink.borrow_mut().push(direction));

        entity.set_target(50.0, 0.0, None);
        entity.set_target(0.0, 50.0, None);
        entity.clear_direction_handler();
        entity.set_target(-50.0, 0.0, None);

        // Bearings 359 and 89
        assert_eq!(*seen.borrow(), vec![56, 8]);
    }

    #[test]
    fn test_direction_is_not_reevaluated_per_tick() {
        let calls = Rc::new(Cell::new(0));
        let mut entity = MotionKernel::new(0.0, 0.0);
        let counter = Rc::clone(&calls);
        entity.set_direction_handler(move |_| counter.set(counter.get() + 1));

        entity.set_target(30.0, 0.0, None);
        for _ in 0..3 {
            entity.step(0.5);
        }

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_zero_speed_never_moves() {
        let mut entity = MotionKernel::new(0.0, 0.0);
        entity.set_speed(0.0);
        entity.set_target(20.0, 0.0, None);

        let outcome = entity.step(1.0);
        assert_eq!(entity.world_position(), (0.0, 0.0));
        assert!(!outcome.arrived);
    }

    #[test]
    fn test_negative_speed_backs_away() {
        let mut entity = MotionKernel::new(10.0, 0.0);
        entity.set_speed(-2.0);
        entity.set_target(20.0, 0.0, None);

        entity.step(1.0);
        let (x, y) = entity.world_position();
        assert!(x < 10.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_clear_path_finishes_current_leg() {
        let mut entity = MotionKernel::new(0.0, 0.0);
        entity.set_target(5.0, 0.0, None);
        entity.set_path(vec![Waypoint::new(2, 0), Waypoint::new(3, 0)], None);
        entity.clear_path();

        for _ in 0..10 {
            entity.step(1.0);
        }

        assert_eq!(entity.world_position(), (5.0, 0.0));
        assert!(entity.is_at_target());
    }

    #[test]
    fn test_layer_round_trips() {
        let mut entity = MotionKernel::new(0.0, 0.0);
        entity.set_layer(3);
        assert_eq!(entity.layer(), 3);
    }
}
