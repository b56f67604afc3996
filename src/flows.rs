//! Persistent store for Prefect flow scripts.
//!
//! Scripts are saved under a single flows directory and executed with an
//! external Python interpreter. Validation is a lightweight marker check:
//! the script must import prefect and define at least one @flow.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{AgentError, AgentResult};

const FLOW_IMPORT_MARKER: &str = "from prefect import";
const FLOW_DECORATOR_MARKER: &str = "@flow";

/// Outcome of running a flow script.
#[derive(Debug, Clone, serde::Serialize, schemars::JsonSchema)]
pub struct FlowRun {
    /// Flow name that was executed
    pub name: String,
    /// Process exit code, if the process terminated normally
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Wall-clock execution time in milliseconds
    pub duration_ms: u64,
}

impl FlowRun {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Store for flow scripts on disk.
#[derive(Debug, Clone)]
pub struct FlowStore {
    dir: PathBuf,
    interpreter: String,
    run_timeout: Duration,
}

impl FlowStore {
    pub fn new(dir: impl Into<PathBuf>, interpreter: impl Into<String>, run_timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            interpreter: interpreter.into(),
            run_timeout,
        }
    }

    /// Save a flow script as `<dir>/<name>.py`, validating the name and
    /// content first. Returns the path written.
    pub async fn save(&self, name: &str, code: &str) -> AgentResult<PathBuf> {
        validate_flow_name(name)?;
        validate_flow_code(code)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AgentError::flow(format!(
                "Cannot create flows directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.script_path(name);
        tokio::fs::write(&path, code).await.map_err(|e| {
            AgentError::flow(format!("Cannot write flow script '{}': {}", path.display(), e))
        })?;

        info!(flow = %name, path = %path.display(), bytes = code.len(), "Saved flow script");
        Ok(path)
    }

    /// Execute a saved flow script and capture its output.
    pub async fn run(&self, name: &str) -> AgentResult<FlowRun> {
        validate_flow_name(name)?;
        let path = self.script_path(name);
        if !path.exists() {
            return Err(AgentError::flow(format!(
                "Flow '{}' not found. Save it first with save_flow.",
                name
            )));
        }

        debug!(flow = %name, interpreter = %self.interpreter, "Running flow script");
        let start = Instant::now();
        let output = Command::new(&self.interpreter)
            .arg(&path)
            .kill_on_drop(true)
            .output();

        let output = match timeout(self.run_timeout, output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(AgentError::flow(format!(
                    "Failed to start '{}': {}. Is the interpreter installed?",
                    self.interpreter, e
                )));
            }
            Err(_) => {
                warn!(flow = %name, timeout_secs = self.run_timeout.as_secs(), "Flow timed out");
                return Err(AgentError::timeout(
                    format!("flow '{}'", name),
                    self.run_timeout.as_secs() as u32,
                ));
            }
        };

        let run = FlowRun {
            name: name.to_string(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            flow = %name,
            exit_code = ?run.exit_code,
            duration_ms = run.duration_ms,
            "Flow finished"
        );
        Ok(run)
    }

    /// List the names of all saved flows.
    pub async fn list(&self) -> AgentResult<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // No directory yet means no flows saved yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => {
                return Err(AgentError::flow(format!(
                    "Cannot read flows directory '{}': {}",
                    self.dir.display(),
                    e
                )));
            }
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AgentError::flow(format!("Cannot list flows: {}", e)))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "py")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn script_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.py"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Flow names become file names, so restrict them to a safe character set.
fn validate_flow_name(name: &str) -> AgentResult<()> {
    if name.is_empty() {
        return Err(AgentError::invalid_input("Flow name cannot be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AgentError::invalid_input(format!(
            "Invalid flow name '{}'. Use only letters, digits, '-' and '_'.",
            name
        )));
    }
    Ok(())
}

/// Marker check that the script is actually a Prefect flow.
fn validate_flow_code(code: &str) -> AgentResult<()> {
    if !code.contains(FLOW_IMPORT_MARKER) {
        return Err(AgentError::invalid_input(
            "Flow script must import prefect (expected 'from prefect import ...')",
        ));
    }
    if !code.contains(FLOW_DECORATOR_MARKER) {
        return Err(AgentError::invalid_input(
            "Flow script must define at least one function decorated with @flow",
        ));
    }
    Ok(())
}
