pub mod config;
pub mod direction;
pub mod error;
pub mod motion;
pub mod numeric;
pub mod snapshot;
pub mod tile;
pub mod trace;

pub use config::Config;
pub use direction::{angle_to_direction, DIRECTION_COUNT};
pub use error::{Error, Result};
pub use motion::{ArriveFn, DirectionFn, MotionKernel, StepOutcome, DEFAULT_SPEED};
pub use snapshot::MotionSnapshot;
pub use tile::{Waypoint, TILE_SIZE};
pub use trace::{MotionEvent, MotionTrace};
