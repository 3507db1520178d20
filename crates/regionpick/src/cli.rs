// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use regionpick_core::{Easing, Point, Rect};

#[derive(Debug, Parser)]
#[command(name = "regionpick", version, about = "Region selection engine driver.")]
pub struct Args {
    /// Log to stderr (in addition to the log file)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Override log file path (default: $XDG_STATE_HOME/regionpick/regionpick.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Override config path (default: $XDG_CONFIG_HOME/regionpick/regionpick.rune)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// Run a scripted pointer session against a recorded layout
    Replay {
        /// JSON layout: monitors, overlay scale, windows, optional elements
        #[arg(long)]
        layout: PathBuf,

        /// Pointer script, one event per line
        #[arg(long)]
        script: PathBuf,

        /// Simulated latency of every candidate lookup
        #[arg(long, default_value_t = 0)]
        lookup_delay_ms: u64,

        /// Override the last-selection file
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// Do not read or write the last-selection file
        #[arg(long)]
        no_store: bool,

        /// Edge grab tolerance in overlay pixels (overrides config)
        #[arg(long)]
        tolerance: Option<i32>,

        /// Start with element lookup enabled (overrides config)
        #[arg(long)]
        find_children: bool,

        /// Jump instead of animating (overrides config)
        #[arg(long)]
        no_animation: bool,

        /// Easing curve (overrides config)
        #[arg(long, value_enum)]
        easing: Option<Easing>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the stored last selection
    Last {
        /// Override the last-selection file
        #[arg(long)]
        state_file: Option<PathBuf>,
    },

    /// Print which edge or corner of a rect a point grabs
    Classify {
        /// min_x,min_y,max_x,max_y
        #[arg(long, value_parser = parse_rect)]
        rect: Rect,

        /// x,y
        #[arg(long, value_parser = parse_point)]
        point: Point,

        /// Edge grab tolerance (default: config value)
        #[arg(long)]
        tolerance: Option<i32>,
    },
}

fn parse_ints(s: &str, n: usize) -> Result<Vec<i32>, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>().map_err(|e| format!("\"{}\": {e}", p.trim())))
        .collect::<Result<_, _>>()?;

    if parts.len() != n {
        return Err(format!("expected {n} comma-separated integers, got {}", parts.len()));
    }
    Ok(parts)
}

pub fn parse_rect(s: &str) -> Result<Rect, String> {
    let v = parse_ints(s, 4)?;
    Ok(Rect::new(v[0], v[1], v[2], v[3]))
}

pub fn parse_point(s: &str) -> Result<Point, String> {
    let v = parse_ints(s, 2)?;
    Ok(Point::new(v[0], v[1]))
}
