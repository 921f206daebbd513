use regex::Regex;
use std::path::PathBuf;
use tokio::process::Command;

use crate::config::ScraperConfig;
use crate::error::{Result, SourcingError};

/// Runs interpreter-driven scripts out of the configured scripts directory
/// and hands back their JSON stdout.
pub struct ScriptRunner {
    python_cmd: String,
    scripts_dir: PathBuf,
}

impl ScriptRunner {
    pub fn new(cfg: &ScraperConfig) -> Self {
        Self {
            python_cmd: cfg.python_cmd.clone(),
            scripts_dir: PathBuf::from(&cfg.scripts_dir),
        }
    }

    /// Execute a script with the given argv and parse its stdout as JSON.
    /// Script-name validation happens at the API boundary; args are passed
    /// through argv, never a shell.
    pub async fn run(&self, script_name: &str, args: &[String]) -> Result<serde_json::Value> {
        let script_path = self.scripts_dir.join(script_name);

        tracing::info!(
            "Executing script {} with {} arg(s)",
            script_path.display(),
            args.len()
        );

        let output = Command::new(&self.python_cmd)
            .arg(&script_path)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                SourcingError::Script(format!(
                    "Failed to spawn {} {}: {e}",
                    self.python_cmd,
                    script_path.display()
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            tracing::warn!("Script {} stderr: {}", script_name, stderr.trim());
        }

        if !output.status.success() {
            return Err(SourcingError::Script(format!(
                "Script {} exited with {}",
                script_name, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_script_output(stdout.trim())
    }
}

/// Parse script stdout as JSON; if the whole output is not JSON, salvage the
/// first bracketed array/object from mixed output (scrapers tend to print
/// progress lines around their result).
pub fn parse_script_output(stdout: &str) -> Result<serde_json::Value> {
    match serde_json::from_str(stdout) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            tracing::warn!(
                "Script output is not clean JSON ({first_err}); attempting to salvage"
            );
            let re = Regex::new(r"(?s)(\[.*\]|\{.*\})").expect("salvage pattern is valid");
            let Some(m) = re.find(stdout) else {
                return Err(SourcingError::Script(format!(
                    "Failed to parse script output as JSON: {first_err}"
                )));
            };
            serde_json::from_str(m.as_str()).map_err(|e| {
                SourcingError::Script(format!("Failed to parse salvaged script output: {e}"))
            })
        }
    }
}
