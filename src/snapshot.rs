use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::motion::MotionKernel;
use crate::tile::Waypoint;

/// Saved motion state of one entity
///
/// Callbacks are not part of a snapshot; the owner re-registers them after
/// restoring. Tile and subcell coordinates are recomputed from the position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSnapshot {
    pub x: f64,
    pub y: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub speed: f64,
    /// Legs after the current target
    #[serde(default)]
    pub path: Vec<Waypoint>,
    #[serde(default)]
    pub layer: i32,
}

impl MotionSnapshot {
    /// Save to file as pretty-printed JSON
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        fs::write(path, json).map_err(|e| Error::io(path, e))?;

        Ok(())
    }

    /// Load from file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let snapshot: MotionSnapshot = serde_json::from_str(&json)?;

        Ok(snapshot)
    }
}

impl MotionKernel {
    /// Capture position, target, speed, remaining path and layer
    pub fn snapshot(&self) -> MotionSnapshot {
        let (x, y) = self.world_position();
        let (target_x, target_y) = self.target();

        MotionSnapshot {
            x,
            y,
            target_x,
            target_y,
            speed: self.speed(),
            path: self.path().iter().copied().collect(),
            layer: self.layer(),
        }
    }

    /// Rebuild a kernel from a snapshot, without any callbacks
    pub fn from_snapshot(snapshot: &MotionSnapshot) -> Self {
        let mut kernel = MotionKernel::new(snapshot.x, snapshot.y);
        kernel.set_target(snapshot.target_x, snapshot.target_y, None);
        kernel.set_path(snapshot.path.iter().copied(), None);
        kernel.set_speed(snapshot.speed);
        kernel.set_layer(snapshot.layer);
        kernel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_captures_route() {
        let mut kernel = MotionKernel::new(3.0, 4.0);
        kernel.set_target(10.0, 4.0, None);
        kernel.set_path(vec![Waypoint::new(2, 1), Waypoint::new(3, 1)], None);
        kernel.set_speed(9.5);
        kernel.set_layer(2);

        let snapshot = kernel.snapshot();
        assert_eq!(snapshot.x, 3.0);
        assert_eq!(snapshot.target_x, 10.0);
        assert_eq!(snapshot.path, vec![Waypoint::new(2, 1), Waypoint::new(3, 1)]);
        assert_eq!(snapshot.speed, 9.5);
        assert_eq!(snapshot.layer, 2);
    }

    #[test]
    fn test_restore_recomputes_cells() {
        let snapshot = MotionSnapshot {
            x: 17.5,
            y: -2.5,
            target_x: 20.0,
            target_y: 0.0,
            speed: 6.0,
            path: Vec::new(),
            layer: 0,
        };

        let kernel = MotionKernel::from_snapshot(&snapshot);
        assert_eq!(kernel.position(), (3, -1));
        assert_eq!(kernel.subcell(), (3.5, 3.5));
        assert_eq!(kernel.snapshot(), snapshot);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{ "x": 1.0, "y": 2.0, "target_x": 1.0, "target_y": 2.0, "speed": 6.0 }"#;
        let snapshot: MotionSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.path.is_empty());
        assert_eq!(snapshot.layer, 0);
    }
}
