// Author: Dustin Pilgrim
// License: MIT

use std::path::Path;

use eventline::debug;
use rune_cfg::RuneConfig;

use regionpick_core::Easing;
use regionpick_engine::SelectionConfig;

/// Values as they appear under `selection` in the rune file; absent keys
/// keep their defaults.
#[derive(Debug, Default, Clone, PartialEq)]
struct RawSelection {
    edge_tolerance: Option<i64>,
    drag_threshold: Option<i64>,
    animation_duration_ms: Option<i64>,
    disable_animation: Option<bool>,
    easing: Option<String>,
    find_children: Option<bool>,
    include_monitors: Option<bool>,
}

/// Load the selection config. A missing file means defaults.
pub fn load(path: &Path) -> Result<SelectionConfig, String> {
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(SelectionConfig::default());
    }

    let rc = RuneConfig::from_file(path)
        .map_err(|e| format!("failed to read config {}: {e}", path.display()))?;

    parse_config(&rc)
}

fn parse_config(rc: &RuneConfig) -> Result<SelectionConfig, String> {
    if !rc.has("selection") {
        return Ok(SelectionConfig::default());
    }

    let raw = RawSelection {
        edge_tolerance: rc
            .get_optional::<i64>("selection.edge_tolerance")
            .map_err(|e| format!("config error at selection.edge_tolerance: {e}"))?,
        drag_threshold: rc
            .get_optional::<i64>("selection.drag_threshold")
            .map_err(|e| format!("config error at selection.drag_threshold: {e}"))?,
        animation_duration_ms: rc
            .get_optional::<i64>("selection.animation_duration_ms")
            .map_err(|e| format!("config error at selection.animation_duration_ms: {e}"))?,
        disable_animation: rc
            .get_optional::<bool>("selection.disable_animation")
            .map_err(|e| format!("config error at selection.disable_animation: {e}"))?,
        easing: rc
            .get_optional::<String>("selection.easing")
            .map_err(|e| format!("config error at selection.easing: {e}"))?,
        find_children: rc
            .get_optional::<bool>("selection.find_children")
            .map_err(|e| format!("config error at selection.find_children: {e}"))?,
        include_monitors: rc
            .get_optional::<bool>("selection.include_monitors")
            .map_err(|e| format!("config error at selection.include_monitors: {e}"))?,
    };

    build(raw)
}

fn pixels(key: &str, v: i64) -> Result<i32, String> {
    if !(0..=1024).contains(&v) {
        return Err(format!("config error at selection.{key}: expected 0..=1024, got {v}"));
    }
    Ok(v as i32)
}

fn build(raw: RawSelection) -> Result<SelectionConfig, String> {
    let mut cfg = SelectionConfig::default();

    if let Some(v) = raw.edge_tolerance {
        cfg.edge_tolerance = pixels("edge_tolerance", v)?;
    }
    if let Some(v) = raw.drag_threshold {
        cfg.drag_threshold = pixels("drag_threshold", v)?;
    }
    if let Some(v) = raw.animation_duration_ms {
        cfg.animation_duration_ms = u64::try_from(v).map_err(|_| {
            format!("config error at selection.animation_duration_ms: must not be negative, got {v}")
        })?;
    }
    if let Some(v) = raw.disable_animation {
        cfg.disable_animation = v;
    }
    if let Some(s) = raw.easing {
        cfg.easing = Easing::parse(&s).ok_or_else(|| {
            format!(
                "config error at selection.easing: expected linear|ease_in|ease_out|ease_in_out, got \"{}\"",
                s.trim()
            )
        })?;
    }
    if let Some(v) = raw.find_children {
        cfg.find_children = v;
    }
    if let Some(v) = raw.include_monitors {
        cfg.include_monitors = v;
    }

    Ok(cfg)
}
