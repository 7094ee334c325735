//! Engine worker process
//!
//! The bridge never touches a process directly. It asks a [`WorkerLauncher`]
//! to probe the host and start an [`EngineWorker`], then writes commands to
//! it. Output comes back as plain lines on a channel the launcher is handed,
//! so the session can select over it like any other event source.
//!
//! [`UciProcessLauncher`] is the real implementation: a child process with
//! piped stdio, one task reading stdout line by line and one task writing
//! queued commands to stdin. The child is killed when the worker is dropped.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::error::{GameError, GameResult};
use crate::game::engine::uci::UciCommand;

/// A running engine accepting UCI commands
pub trait EngineWorker: Send {
    fn send(&mut self, command: &UciCommand) -> GameResult<()>;
}

/// Starts engine workers
pub trait WorkerLauncher: Send {
    /// Check that the host can run the worker at all
    fn probe(&self) -> GameResult<()>;

    /// Start a worker whose output lines are delivered to `lines`
    ///
    /// Must be called from within a tokio runtime.
    fn launch(&self, lines: mpsc::UnboundedSender<String>) -> GameResult<Box<dyn EngineWorker>>;
}

/// Launches a UCI engine executable
#[derive(Debug, Clone)]
pub struct UciProcessLauncher {
    binary: PathBuf,
}

impl UciProcessLauncher {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl WorkerLauncher for UciProcessLauncher {
    fn probe(&self) -> GameResult<()> {
        if resolve_binary(&self.binary).is_none() {
            return Err(GameError::UnsupportedEnvironment {
                reason: format!("engine binary {:?} not found", self.binary),
            });
        }
        std::thread::available_parallelism().map_err(|e| GameError::UnsupportedEnvironment {
            reason: format!("host parallelism unavailable: {e}"),
        })?;
        Ok(())
    }

    fn launch(&self, lines: mpsc::UnboundedSender<String>) -> GameResult<Box<dyn EngineWorker>> {
        let binary = resolve_binary(&self.binary).unwrap_or_else(|| self.binary.clone());
        let mut child = Command::new(&binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GameError::Worker {
                message: format!("failed to start {:?}: {e}", binary),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| GameError::Worker {
            message: "engine stdin unavailable".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| GameError::Worker {
            message: "engine stdout unavailable".to_string(),
        })?;

        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout).lines();
            loop {
                match reader.next_line().await {
                    Ok(Some(line)) => {
                        if lines.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("[ENGINE] Engine output closed");
                        break;
                    }
                    Err(e) => {
                        warn!("[ENGINE] Failed to read engine output: {}", e);
                        break;
                    }
                }
            }
        });

        let (commands, mut queue) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(command) = queue.recv().await {
                let written = async {
                    stdin.write_all(command.as_bytes()).await?;
                    stdin.write_all(b"\n").await?;
                    stdin.flush().await
                }
                .await;
                if let Err(e) = written {
                    warn!("[ENGINE] Failed to write '{}' to engine: {}", command, e);
                    break;
                }
            }
        });

        info!("[ENGINE] Started engine process {:?}", binary);
        Ok(Box::new(UciProcess { child, commands }))
    }
}

/// A running engine child process
struct UciProcess {
    child: Child,
    commands: mpsc::UnboundedSender<String>,
}

impl EngineWorker for UciProcess {
    fn send(&mut self, command: &UciCommand) -> GameResult<()> {
        debug!("[ENGINE] > {}", command);
        self.commands
            .send(command.to_string())
            .map_err(|_| GameError::Worker {
                message: "engine input closed".to_string(),
            })
    }
}

impl Drop for UciProcess {
    fn drop(&mut self) {
        let _ = self.commands.send(UciCommand::Quit.to_string());
        if let Err(e) = self.child.start_kill() {
            debug!("[ENGINE] Engine process already gone: {}", e);
        }
    }
}

/// Locate an executable, searching `PATH` for bare names
fn resolve_binary(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 {
        return binary.is_file().then(|| binary.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}
