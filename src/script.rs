use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Script {0} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to start script {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Script {path} exited with {status}")]
    Failed { path: PathBuf, status: ExitStatus },
}

/// Runs the measurement script that follows a cooldown.
#[derive(Debug, Clone, Default)]
pub struct ScriptRunner {
    interpreter: Option<PathBuf>,
}

impl ScriptRunner {
    /// Execute scripts directly; they must be executable on their own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute scripts as `<interpreter> <script>`, e.g. `python`.
    pub fn with_interpreter(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: Some(interpreter.into()),
        }
    }

    /// Run `script` to completion in the current working directory.
    ///
    /// The child inherits stdio so its output shows up next to the logger's.
    pub fn run(&self, script: &Path) -> Result<ExitStatus, ScriptError> {
        if !script.exists() {
            return Err(ScriptError::NotFound(script.to_path_buf()));
        }

        let mut command = match &self.interpreter {
            Some(interpreter) => {
                let mut command = Command::new(interpreter);
                command.arg(script);
                command
            }
            None => Command::new(script),
        };

        log::info!("Executing {}...", script.display());
        let status = command.status().map_err(|source| ScriptError::Spawn {
            path: script.to_path_buf(),
            source,
        })?;

        if status.success() {
            Ok(status)
        } else {
            Err(ScriptError::Failed {
                path: script.to_path_buf(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("measure.py");
        let result = ScriptRunner::new().run(&missing);
        assert!(matches!(result, Err(ScriptError::NotFound(path)) if path == missing));
    }

    #[cfg(unix)]
    #[test]
    fn test_interpreter_runs_script() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let script = dir.path().join("measure.sh");
        std::fs::write(&script, format!("touch '{}'\n", marker.display())).unwrap();

        let status = ScriptRunner::with_interpreter("sh").run(&script).unwrap();
        assert!(status.success());
        assert!(marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fail.sh");
        std::fs::write(&script, "exit 3\n").unwrap();

        let result = ScriptRunner::with_interpreter("sh").run(&script);
        assert!(matches!(result, Err(ScriptError::Failed { .. })));
    }
}
