use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::motion::DEFAULT_SPEED;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub entity: EntityConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_cols")]
    pub cols: i32,
    #[serde(default = "default_rows")]
    pub rows: i32,
    /// Screen pixels per tile
    #[serde(default = "default_tile_pixels")]
    pub tile_pixels: f32,
}

#[derive(Debug, Deserialize)]
pub struct EntityConfig {
    #[serde(default = "default_start_tile_x")]
    pub start_tile_x: i32,
    #[serde(default = "default_start_tile_y")]
    pub start_tile_y: i32,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub layer: i32,
}

#[derive(Debug, Deserialize)]
pub struct SimulationConfig {
    /// Longest tick handed to the kernel; slower frames are clamped to this
    #[serde(default = "default_max_tick_seconds")]
    pub max_tick_seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_bg")]
    pub background_r: u8,
    #[serde(default = "default_bg")]
    pub background_g: u8,
    #[serde(default = "default_bg")]
    pub background_b: u8,
    #[serde(default = "default_show_subcells")]
    pub show_subcells: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_enable_trace")]
    pub enable_trace: bool,
    #[serde(default = "default_trace_path")]
    pub trace_path: String,
}

// Default values
fn default_cols() -> i32 { 32 }
fn default_rows() -> i32 { 24 }
fn default_tile_pixels() -> f32 { 25.0 }
fn default_start_tile_x() -> i32 { 4 }
fn default_start_tile_y() -> i32 { 4 }
fn default_speed() -> f64 { DEFAULT_SPEED }
fn default_max_tick_seconds() -> f64 { 0.25 }
fn default_window_title() -> String { "tilestep - motion kernel demo".to_string() }
fn default_bg() -> u8 { 30 }
fn default_show_subcells() -> bool { true }
fn default_filter() -> String { "tilestep=info".to_string() }
fn default_enable_trace() -> bool { true }
fn default_trace_path() -> String { "motion_trace.json".to_string() }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            tile_pixels: default_tile_pixels(),
        }
    }
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            start_tile_x: default_start_tile_x(),
            start_tile_y: default_start_tile_y(),
            speed: default_speed(),
            layer: 0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_tick_seconds: default_max_tick_seconds(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            background_r: default_bg(),
            background_g: default_bg(),
            background_b: default_bg(),
            show_subcells: default_show_subcells(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            enable_trace: default_enable_trace(),
            trace_path: default_trace_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            entity: EntityConfig::default(),
            simulation: SimulationConfig::default(),
            visual: VisualConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `config.toml`, or use defaults if it is missing or broken
    pub fn load() -> Self {
        match Self::load_from("config.toml") {
            Ok(config) => {
                info!("loaded configuration from config.toml");
                config
            }
            Err(Error::Io { .. }) => {
                info!("no config.toml found, using default configuration");
                Config::default()
            }
            Err(e) => {
                warn!(error = %e, "failed to parse config.toml, using default configuration");
                Config::default()
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
