use crate::model::BuildStatus;
use std::fs;
use std::path::{Path, PathBuf};

/// How many trailing log lines make up the record's log window.
pub const LOG_TAIL_LINES: usize = 1000;

/// Optional capability of executions whose pipeline is driven by an
/// in-memory script instead of a file under version control. Queried
/// explicitly; most executions do not expose it.
pub trait ScriptSource {
    fn script(&self) -> Result<String, String>;
}

/// One completed run of a CI job, as seen by the extraction pipeline.
pub trait BuildExecution {
    /// Full path of the owning job, e.g. `team/app`.
    fn job_name(&self) -> &str;

    fn number(&self) -> i64;

    /// Terminal result; `None` when the host reported no explicit outcome.
    fn result(&self) -> Option<BuildStatus>;

    /// The last `limit` lines of the build log, oldest first.
    fn log_tail(&self, limit: usize) -> Result<Vec<String>, String>;

    fn workspace(&self) -> Option<&Path>;

    fn script_source(&self) -> Option<&dyn ScriptSource>;
}

/// Execution backed by CLI flags, host environment variables, and files on
/// disk — what a post-build shell step has access to.
#[derive(Debug, Clone, Default)]
pub struct CompletedBuild {
    pub job_name: String,
    pub number: i64,
    pub result: Option<BuildStatus>,
    pub log_file: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub script_file: Option<PathBuf>,
}

impl BuildExecution for CompletedBuild {
    fn job_name(&self) -> &str {
        &self.job_name
    }

    fn number(&self) -> i64 {
        self.number
    }

    fn result(&self) -> Option<BuildStatus> {
        self.result
    }

    fn log_tail(&self, limit: usize) -> Result<Vec<String>, String> {
        let Some(path) = &self.log_file else {
            return Ok(Vec::new());
        };

        let text = fs::read_to_string(path)
            .map_err(|e| format!("read log file {}: {e}", path.display()))?;

        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        if lines.len() > limit {
            lines = lines.split_off(lines.len() - limit);
        }

        Ok(lines)
    }

    fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    fn script_source(&self) -> Option<&dyn ScriptSource> {
        if self.script_file.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl ScriptSource for CompletedBuild {
    fn script(&self) -> Result<String, String> {
        let Some(path) = &self.script_file else {
            return Err("no script file".to_string());
        };

        fs::read_to_string(path).map_err(|e| format!("read script file {}: {e}", path.display()))
    }
}
