use std::cell::{Cell, RefCell};
use std::rc::Rc;

use arboard::Clipboard;
use macroquad::prelude::*;
use tilestep::direction::DIRECTION_COUNT;
use tilestep::tile::{line_waypoints, tile_of, SUBCELL_ORIGIN};
use tilestep::{ArriveFn, Config, MotionEvent, MotionKernel, MotionSnapshot, MotionTrace, Waypoint, TILE_SIZE};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SNAPSHOT_PATH: &str = "snapshot.json";

/// Visualization state
struct DemoState {
    config: Config,
    kernel: MotionKernel,
    /// Tiles of the last route handed to the kernel, for drawing
    route: Vec<Waypoint>,
    trace: Rc<RefCell<MotionTrace>>,
    facing: Rc<Cell<usize>>,
    arrivals: Rc<Cell<u32>>,
}

impl DemoState {
    fn new(config: Config) -> Self {
        let mut kernel = MotionKernel::at_tile(config.entity.start_tile_x, config.entity.start_tile_y);
        kernel.set_speed(config.entity.speed);
        kernel.set_layer(config.entity.layer);

        let mut state = DemoState {
            config,
            kernel,
            route: Vec::new(),
            trace: Rc::new(RefCell::new(MotionTrace::new())),
            facing: Rc::new(Cell::new(0)),
            arrivals: Rc::new(Cell::new(0)),
        };
        state.attach_direction_handler();
        state
    }

    fn attach_direction_handler(&mut self) {
        let facing = Rc::clone(&self.facing);
        let trace = Rc::clone(&self.trace);
        self.kernel.set_direction_handler(move |direction| {
            facing.set(direction);
            trace.borrow_mut().log(MotionEvent::DirectionChanged { direction });
        });
    }

    fn arrival_callback(&self) -> ArriveFn {
        let arrivals = Rc::clone(&self.arrivals);
        Box::new(move || arrivals.set(arrivals.get() + 1))
    }

    fn world_scale(&self) -> f32 {
        self.config.grid.tile_pixels / TILE_SIZE as f32
    }

    fn tile_under_mouse(&self) -> Option<Waypoint> {
        let (mouse_x, mouse_y) = mouse_position();
        let tile_x = (mouse_x / self.config.grid.tile_pixels).floor() as i32;
        let tile_y = (mouse_y / self.config.grid.tile_pixels).floor() as i32;

        if tile_x >= 0 && tile_x < self.config.grid.cols && tile_y >= 0 && tile_y < self.config.grid.rows {
            Some(Waypoint::new(tile_x, tile_y))
        } else {
            None
        }
    }

    /// Left click: walk a straight tile line to the clicked tile
    fn walk_to(&mut self, destination: Waypoint) {
        let (tile_x, tile_y) = self.kernel.position();
        let route = line_waypoints(Waypoint::new(tile_x, tile_y), destination);

        let Some((first, rest)) = route.split_first() else {
            return;
        };

        let (x, y) = first.to_world();
        self.trace.borrow_mut().log(MotionEvent::TargetSet { x, y });
        let done = self.arrival_callback();
        self.kernel.set_target(x, y, None);
        self.kernel.set_path(rest.iter().copied(), Some(done));

        info!(tile_x = destination.x, tile_y = destination.y, legs = route.len(), "walking");
        self.route = route;
    }

    /// Right click: head straight for the tile without a route
    fn jump_target(&mut self, destination: Waypoint) {
        let (x, y) = destination.to_world();
        self.trace.borrow_mut().log(MotionEvent::TargetSet { x, y });
        let done = self.arrival_callback();
        self.kernel.clear_path();
        self.kernel.set_target(x, y, Some(done));
        self.route = vec![destination];
    }

    fn change_speed(&mut self, delta: f64) {
        let speed = self.kernel.speed() + delta;
        self.kernel.set_speed(speed);
        self.trace.borrow_mut().log(MotionEvent::SpeedChanged { speed });
    }

    fn clear_path(&mut self) {
        self.kernel.clear_path();
        self.trace.borrow_mut().log(MotionEvent::PathCleared);
        let (target_x, target_y) = self.kernel.target();
        self.route = vec![Waypoint::new(tile_of(target_x), tile_of(target_y))];
    }

    fn save_snapshot(&self) {
        match self.kernel.snapshot().save_to_file(SNAPSHOT_PATH) {
            Ok(()) => info!(path = SNAPSHOT_PATH, "snapshot saved"),
            Err(e) => error!(error = %e, "failed to save snapshot"),
        }
    }

    fn load_snapshot(&mut self) {
        match MotionSnapshot::load_from_file(SNAPSHOT_PATH) {
            Ok(snapshot) => {
                self.kernel = MotionKernel::from_snapshot(&snapshot);
                self.attach_direction_handler();
                self.route = snapshot.path;
                info!(path = SNAPSHOT_PATH, "snapshot restored");
            }
            Err(e) => error!(error = %e, "failed to load snapshot"),
        }
    }

    fn copy_trace_to_clipboard(&self) {
        let json = match self.trace.borrow().to_json() {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize trace");
                return;
            }
        };

        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(json) {
                    error!(error = %e, "failed to copy to clipboard");
                } else {
                    info!("motion trace copied to clipboard");
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => error!(error = %e, "failed to access clipboard"),
        }
    }

    fn tick(&mut self) {
        let dt = f64::from(get_frame_time()).min(self.config.simulation.max_tick_seconds);
        let outcome = self.kernel.step(dt);

        let mut trace = self.trace.borrow_mut();
        trace.record_step(&outcome);
        trace.advance(dt);
    }

    fn finish(&self) {
        let trace = self.trace.borrow();
        println!("{}", trace.summary());

        if self.config.logging.enable_trace {
            match trace.save_to_file(&self.config.logging.trace_path) {
                Ok(()) => info!(path = %self.config.logging.trace_path, "motion trace saved"),
                Err(e) => error!(error = %e, "failed to save motion trace"),
            }
        }
    }

    fn draw(&self) {
        let visual = &self.config.visual;
        clear_background(Color::from_rgba(visual.background_r, visual.background_g, visual.background_b, 255));

        let size = self.config.grid.tile_pixels;
        for y in 0..self.config.grid.rows {
            for x in 0..self.config.grid.cols {
                let color = if self.route.contains(&Waypoint::new(x, y)) {
                    Color::from_rgba(70, 110, 70, 255)
                } else {
                    Color::from_rgba(60, 60, 60, 255)
                };
                draw_rectangle(x as f32 * size, y as f32 * size, size - 1.0, size - 1.0, color);
            }
        }

        let scale = self.world_scale();
        let (tile_x, tile_y) = self.kernel.position();
        draw_rectangle_lines(tile_x as f32 * size, tile_y as f32 * size, size, size, 2.0, YELLOW);

        if visual.show_subcells {
            let (sub_x, sub_y) = self.kernel.subcell();
            let cell = (sub_x - SUBCELL_ORIGIN).floor() as f32;
            let row = (sub_y - SUBCELL_ORIGIN).floor() as f32;
            draw_rectangle(
                tile_x as f32 * size + cell * scale,
                tile_y as f32 * size + row * scale,
                scale,
                scale,
                Color::from_rgba(200, 200, 80, 120),
            );
        }

        let (target_x, target_y) = self.kernel.target();
        draw_circle_lines(target_x as f32 * scale, target_y as f32 * scale, 4.0, 1.0, RED);

        let (world_x, world_y) = self.kernel.world_position();
        let (px, py) = (world_x as f32 * scale, world_y as f32 * scale);
        draw_circle(px, py, size * 0.3, BLUE);

        // Centre of the facing bucket, in the same bearing convention the kernel steps with
        let degrees_per_direction = 360.0 / DIRECTION_COUNT as f32;
        let bearing = 45.0 + self.facing.get() as f32 * degrees_per_direction;
        let radians = bearing.to_radians();
        draw_line(px, py, px + radians.cos() * size * 0.6, py + radians.sin() * size * 0.6, 2.0, WHITE);

        let (fx, fy) = self.kernel.position_f();
        let (sub_x, sub_y) = self.kernel.subcell();
        let info = format!(
            "Tile: ({}, {})  Subcell: ({:.2}, {:.2})  PositionF: ({:.3}, {:.3})\n\
             Speed: {:.1}  Facing: {}  Waypoints left: {}  Arrivals: {}\n\
             Left click: walk  Right click: set target  C: clear path  Up/Down: speed\n\
             S/L: save/load snapshot  Y: copy trace  Esc: quit",
            tile_x,
            tile_y,
            sub_x,
            sub_y,
            fx,
            fy,
            self.kernel.speed(),
            self.facing.get(),
            self.kernel.path().len(),
            self.arrivals.get()
        );
        let bottom = self.config.grid.rows as f32 * size;
        for (i, line) in info.lines().enumerate() {
            draw_text(line, 10.0, bottom + 20.0 + i as f32 * 20.0, 20.0, WHITE);
        }
    }
}

/// Config read without logging, for use before the subscriber exists
fn quiet_config() -> Config {
    Config::load_from("config.toml").unwrap_or_default()
}

fn window_conf() -> Conf {
    let config = quiet_config();
    Conf {
        window_title: config.visual.window_title.clone(),
        window_width: (config.grid.cols as f32 * config.grid.tile_pixels) as i32,
        window_height: (config.grid.rows as f32 * config.grid.tile_pixels) as i32 + 100,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(quiet_config().logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load();

    let mut state = DemoState::new(config);

    loop {
        if is_mouse_button_pressed(MouseButton::Left) {
            if let Some(tile) = state.tile_under_mouse() {
                state.walk_to(tile);
            }
        } else if is_mouse_button_pressed(MouseButton::Right) {
            if let Some(tile) = state.tile_under_mouse() {
                state.jump_target(tile);
            }
        }

        if is_key_pressed(KeyCode::C) {
            state.clear_path();
        }
        if is_key_pressed(KeyCode::Up) {
            state.change_speed(1.0);
        }
        if is_key_pressed(KeyCode::Down) {
            state.change_speed(-1.0);
        }
        if is_key_pressed(KeyCode::S) {
            state.save_snapshot();
        }
        if is_key_pressed(KeyCode::L) {
            state.load_snapshot();
        }
        if is_key_pressed(KeyCode::Y) {
            state.copy_trace_to_clipboard();
        }

        // Close window on Escape
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.tick();
        state.draw();

        next_frame().await
    }

    state.finish();
}
