use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::motion::StepOutcome;

/// Something the kernel (or its owner) did that is worth keeping
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MotionEvent {
    /// A new immediate target was assigned (world units)
    TargetSet { x: f64, y: f64 },
    /// The direction handler picked a facing
    DirectionChanged { direction: usize },
    /// Waypoints pulled off the queue during one tick
    WaypointsConsumed { count: usize },
    /// The final target was reached and completion fired
    Arrived,
    /// Remaining waypoints were dropped
    PathCleared,
    /// Speed changed
    SpeedChanged { speed: f64 },
    /// A tick stopped early on the iteration cap
    IterationCapHit,
}

/// Event with the simulated time it happened at
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TracedEvent {
    /// Seconds of simulated time since the trace started
    pub time: f64,
    pub event: MotionEvent,
}

/// Append-only log of motion events, timestamped with simulated time
#[derive(Debug, Default)]
pub struct MotionTrace {
    clock: f64,
    events: Vec<TracedEvent>,
}

impl MotionTrace {
    pub fn new() -> Self {
        MotionTrace::default()
    }

    /// Move the trace clock forward by one tick
    pub fn advance(&mut self, tick: f64) {
        self.clock += tick;
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Log an event at the current clock
    pub fn log(&mut self, event: MotionEvent) {
        self.events.push(TracedEvent {
            time: self.clock,
            event,
        });
    }

    /// Turn a step report into events
    pub fn record_step(&mut self, outcome: &StepOutcome) {
        if outcome.waypoints_consumed > 0 {
            self.log(MotionEvent::WaypointsConsumed {
                count: outcome.waypoints_consumed,
            });
        }
        if outcome.hit_iteration_cap {
            self.log(MotionEvent::IterationCapHit);
        }
        if outcome.completed {
            self.log(MotionEvent::Arrived);
        }
    }

    pub fn events(&self) -> &[TracedEvent] {
        &self.events
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.events)?)
    }

    /// Save trace to JSON file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut targets = 0;
        let mut turns = 0;
        let mut waypoints = 0;
        let mut arrivals = 0;
        let mut capped = 0;

        for traced in &self.events {
            match &traced.event {
                MotionEvent::TargetSet { .. } => targets += 1,
                MotionEvent::DirectionChanged { .. } => turns += 1,
                MotionEvent::WaypointsConsumed { count } => waypoints += count,
                MotionEvent::Arrived => arrivals += 1,
                MotionEvent::IterationCapHit => capped += 1,
                _ => {}
            }
        }

        format!(
            "Simulated: {:.2}s\n\
             Total Events: {}\n\
             Targets: {} set, {} facing changes\n\
             Route: {} waypoints consumed, {} arrivals, {} capped ticks",
            self.clock,
            self.events.len(),
            targets,
            turns,
            waypoints,
            arrivals,
            capped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_carry_clock() {
        let mut trace = MotionTrace::new();
        trace.log(MotionEvent::TargetSet { x: 5.0, y: 0.0 });
        trace.advance(0.5);
        trace.advance(0.25);
        trace.log(MotionEvent::Arrived);

        let events = trace.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].time, 0.0);
        assert_eq!(events[1].time, 0.75);
    }

    #[test]
    fn test_record_step_skips_quiet_ticks() {
        let mut trace = MotionTrace::new();
        trace.record_step(&StepOutcome::default());
        assert!(trace.events().is_empty());

        trace.record_step(&StepOutcome {
            waypoints_consumed: 3,
            arrived: true,
            completed: true,
            iterations: 5,
            hit_iteration_cap: false,
        });
        assert_eq!(
            trace.events().iter().map(|e| e.event.clone()).collect::<Vec<_>>(),
            vec![MotionEvent::WaypointsConsumed { count: 3 }, MotionEvent::Arrived]
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut trace = MotionTrace::new();
        trace.log(MotionEvent::TargetSet { x: 1.0, y: 1.0 });
        trace.log(MotionEvent::DirectionChanged { direction: 4 });
        trace.log(MotionEvent::WaypointsConsumed { count: 2 });
        trace.log(MotionEvent::WaypointsConsumed { count: 1 });
        trace.log(MotionEvent::Arrived);

        let summary = trace.summary();
        assert!(summary.contains("Total Events: 5"));
        assert!(summary.contains("3 waypoints consumed, 1 arrivals"));
    }
}
