// Author: Dustin Pilgrim
// License: MIT

use std::path::Path;

use eventline::runtime::{self, LogLevel};
use futures::executor::block_on;

use crate::paths::ensure_parent_dir;

pub fn init_logging(log_path: &Path, verbose: bool) -> Result<(), String> {
    ensure_parent_dir(log_path).map_err(|e| format!("create log dir: {e}"))?;

    block_on(runtime::init());

    // Always log to file.
    runtime::enable_file_output(log_path).map_err(|e| format!("enable file output: {e}"))?;

    // Console output only when verbose.
    runtime::enable_console_output(verbose);
    runtime::enable_console_color(verbose);

    runtime::set_log_level(if verbose { LogLevel::Debug } else { LogLevel::Info });

    Ok(())
}
