#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tilestep::{ArriveFn, MotionKernel, Waypoint};

/// Completion callback that counts how often it ran
pub fn counting_arrival() -> (Rc<Cell<u32>>, Option<ArriveFn>) {
    let count = Rc::new(Cell::new(0));
    let handle = Rc::clone(&count);
    let done: ArriveFn = Box::new(move || handle.set(handle.get() + 1));
    (count, Some(done))
}

/// Register a direction handler that records every facing it is given
pub fn record_directions(kernel: &mut MotionKernel) -> Rc<RefCell<Vec<usize>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    kernel.set_direction_handler(move |direction| sink.borrow_mut().push(direction));
    seen
}

/// Point a kernel at the first waypoint and queue the rest, the way a caller
/// hands over a freshly searched route
pub fn follow(kernel: &mut MotionKernel, route: &[Waypoint], on_arrive: Option<ArriveFn>) {
    if let Some((first, rest)) = route.split_first() {
        let (x, y) = first.to_world();
        kernel.set_target(x, y, None);
        kernel.set_path(rest.iter().copied(), on_arrive);
    }
}

/// Straight-line distance covered by a route starting at `start`
pub fn route_length(start: (f64, f64), route: &[Waypoint]) -> f64 {
    let mut length = 0.0;
    let mut previous = start;
    for waypoint in route {
        let next = waypoint.to_world();
        length += (next.0 - previous.0).hypot(next.1 - previous.1);
        previous = next;
    }
    length
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {} of {}",
        actual,
        tolerance,
        expected
    );
}
