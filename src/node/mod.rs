// snapshottool/src/node/mod.rs
use std::process::{Command, Stdio};
use sysinfo::System;
use tracing::{info, warn};

use crate::errors::{Result, SnapshotError};

/// Forcefully stops every running process matching `process_name`.
///
/// Returns true if at least one process was signalled. A name with no match
/// is not an error: the node may simply not be running.
pub fn stop_node(process_name: &str) -> bool {
    let mut sys = System::new_all();
    sys.refresh_all();

    let mut stopped = 0;
    for process in sys.processes_by_name(process_name) {
        if process.kill() {
            info!("stopped node process {} (pid {})", process_name, process.pid());
            stopped += 1;
        } else {
            warn!(
                "failed to signal node process {} (pid {})",
                process_name,
                process.pid()
            );
        }
    }

    if stopped == 0 {
        warn!("no running process named {process_name} found, nothing to stop");
    }
    stopped > 0
}

/// Launches the node start command detached from this process.
///
/// stdout/stderr go to the null device so the node's own output never lands
/// in the snapshot log. Returns the child pid. This only means the launch
/// was issued; use [`is_node_running`] to probe liveness.
pub fn start_node(command: &[String]) -> Result<u32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| SnapshotError::Config("Node start command is empty".to_string()))?;

    let program_path = which::which(program).map_err(|e| {
        SnapshotError::NodeControl(format!("Node executable {program} not found: {e}"))
    })?;

    let child = Command::new(&program_path)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            SnapshotError::NodeControl(format!(
                "Failed to launch {}: {e}",
                program_path.display()
            ))
        })?;

    let pid = child.id();
    info!("node launch requested: {} (pid {pid})", program_path.display());
    Ok(pid)
}

/// Liveness probe, separate from [`start_node`] on purpose: a successful
/// launch request says nothing about whether the node is still up.
pub fn is_node_running(process_name: &str) -> bool {
    let mut sys = System::new_all();
    sys.refresh_all();
    sys.processes_by_name(process_name).next().is_some()
}
