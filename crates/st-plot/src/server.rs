// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Plotting server processes started on behalf of a training run.

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{PlotError, PlotResult};

/// Program and arguments used to launch the plotting server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ServerCommand {
    /// In-memory server listening on all interfaces.
    fn default() -> Self {
        Self::new("bokeh-server")
            .arg("--ip")
            .arg("0.0.0.0")
            .arg("--backend")
            .arg("memory")
    }
}

impl ServerCommand {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How the server process is spawned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOptions {
    /// Keep interrupts aimed at the training process away from the server.
    pub shield_interrupts: bool,
    /// Unconditional wait after spawning before the server is used.
    pub settle_delay: Duration,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            shield_interrupts: true,
            settle_delay: Duration::from_secs(2),
        }
    }
}

impl SpawnOptions {
    pub fn with_shield_interrupts(mut self, shield: bool) -> Self {
        self.shield_interrupts = shield;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// A running server process. Dropping the handle leaves the process running.
pub struct ServerHandle {
    pid: u32,
    child: Child,
}

impl core::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServerHandle").field("pid", &self.pid).finish()
    }
}

impl ServerHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// The child process, with its piped stdout and stderr.
    pub fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    pub fn into_child(self) -> Child {
        self.child
    }
}

/// Spawns the server, waits for the settle delay and logs its PID.
///
/// Output streams are piped but never read. The process is not stopped
/// when training ends; shut it down manually using the logged PID.
pub fn spawn(command: &ServerCommand, options: &SpawnOptions) -> PlotResult<ServerHandle> {
    info!(command = %command.command_line(), "starting plotting server");
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if options.shield_interrupts {
        shield_interrupts(&mut cmd);
    }
    let child = cmd.spawn().map_err(|source| PlotError::ServerSpawn {
        program: command.program.clone(),
        source,
    })?;
    if !options.settle_delay.is_zero() {
        std::thread::sleep(options.settle_delay);
    }
    let pid = child.id();
    info!(pid, "plotting server PID: {pid}");
    Ok(ServerHandle { pid, child })
}

// A separate process group does not receive the terminal's SIGINT.
#[cfg(unix)]
fn shield_interrupts(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn shield_interrupts(_cmd: &mut Command) {
    tracing::debug!("interrupt shielding is not supported on this platform");
}
