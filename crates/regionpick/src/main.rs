// Author: Dustin Pilgrim
// License: MIT

mod cli;
mod config;
mod logging;
mod paths;
mod replay;
mod store;

use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;

use eventline::{debug, error, info};

use regionpick_core::Rect;
use regionpick_engine::geometry::{classify_edge_proximity, cursor_for};
use regionpick_engine::{LastSelectionStore, SelectionConfig};

use crate::cli::{Args, Cmd};
use crate::replay::{Layout, ReplayOptions, ReplayOutcome};
use crate::store::FileStore;

fn main() {
    let args = Args::parse();

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| paths::default_log_path("regionpick.log"));

    if let Err(e) = logging::init_logging(&log_path, args.verbose) {
        // logging should never block normal usage
        eprintln!("regionpick: failed to init logging: {e}");
    }

    if let Err(e) = run(args) {
        error!("{e}");
        eprintln!("regionpick: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), String> {
    debug!("parsed args: {:?}", args.cmd);

    let config_path = args.config.unwrap_or_else(paths::default_config_path);
    let mut cfg = config::load(&config_path)?;

    match args.cmd {
        Cmd::Replay {
            layout,
            script,
            lookup_delay_ms,
            state_file,
            no_store,
            tolerance,
            find_children,
            no_animation,
            easing,
            json,
        } => {
            if let Some(t) = tolerance {
                cfg.edge_tolerance = t.max(0);
            }
            if find_children {
                cfg.find_children = true;
            }
            if no_animation {
                cfg.disable_animation = true;
            }
            if let Some(e) = easing {
                cfg.easing = e;
            }

            let store: Option<Rc<dyn LastSelectionStore>> = if no_store {
                None
            } else {
                let path = state_file.unwrap_or_else(paths::default_state_path);
                Some(Rc::new(FileStore::new(path)) as Rc<dyn LastSelectionStore>)
            };

            let outcome = run_replay(&layout, &script, cfg, lookup_delay_ms, store)?;
            print_outcome(&outcome, json)?;
        }

        Cmd::Last { state_file } => {
            let path = state_file.unwrap_or_else(paths::default_state_path);
            let rec = FileStore::new(path.clone())
                .read()
                .map_err(|e| e.to_string())?;

            match rec {
                Some(rec) => println!("{} (saved at {})", fmt_rect(rec.rect), rec.saved_at),
                None => println!("(no last selection at {})", path.display()),
            }
        }

        Cmd::Classify { rect, point, tolerance } => {
            let tol = tolerance.unwrap_or(cfg.edge_tolerance);
            let mode = classify_edge_proximity(rect, point, tol);
            println!("{mode:?} ({})", cursor_for(mode).theme_name());
        }
    }

    Ok(())
}

fn read_file(path: &Path, what: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {what} {}: {e}", path.display()))
}

fn run_replay(
    layout_path: &Path,
    script_path: &Path,
    cfg: SelectionConfig,
    lookup_delay_ms: u64,
    store: Option<Rc<dyn LastSelectionStore>>,
) -> Result<ReplayOutcome, String> {
    let layout = Layout::from_json(&read_file(layout_path, "layout")?)
        .map_err(|e| format!("{}: {e}", layout_path.display()))?;
    let steps = replay::parse_script(&read_file(script_path, "script")?)
        .map_err(|e| format!("{}: {e}", script_path.display()))?;

    info!(
        "replaying {} against {}",
        script_path.display(),
        layout_path.display()
    );

    Ok(replay::run(
        layout,
        &steps,
        cfg,
        ReplayOptions {
            lookup_delay: Duration::from_millis(lookup_delay_ms),
            store,
        },
    ))
}

fn fmt_rect(r: Rect) -> String {
    format!("{},{} {}x{}", r.min_x, r.min_y, r.width(), r.height())
}

fn print_outcome(out: &ReplayOutcome, json: bool) -> Result<(), String> {
    if json {
        let s = serde_json::to_string_pretty(out).map_err(|e| format!("encode result: {e}"))?;
        println!("{s}");
        return Ok(());
    }

    println!("state: {:?}", out.state);
    match (out.rect, out.global_rect) {
        (Some(r), Some(g)) => println!("rect: {} (global {})", fmt_rect(r), fmt_rect(g)),
        _ => println!("rect: none"),
    }
    if let Some(id) = out.candidate {
        println!("candidate: {id} (level {})", out.level);
    }
    if let Some(p) = &out.pointer {
        match (&p.monitor, p.logical) {
            (Some(name), Some((lx, ly))) => println!(
                "pointer: {},{} (global {},{}; {name} logical {lx:.1},{ly:.1})",
                p.overlay.x, p.overlay.y, p.global.x, p.global.y
            ),
            _ => println!(
                "pointer: {},{} (global {},{})",
                p.overlay.x, p.overlay.y, p.global.x, p.global.y
            ),
        }
    }
    println!(
        "lookups: {} ({} dropped, {} failed)",
        out.lookups, out.dropped, out.failed
    );
    Ok(())
}
