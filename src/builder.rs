use crate::environment::Environment;
use crate::execution::{BuildExecution, LOG_TAIL_LINES};
use crate::locator;
use crate::model::{BuildRecord, BuildStatus, JobRecord};
use crate::sanitize::sanitize;

/// Prefix of the synthetic workflow content used when no pipeline
/// definition could be located.
pub const FALLBACK_PREFIX: &str = "Script not found. Showing logs as fallback.";

// The host writes its own completion marker into the log stream after
// completion listeners run, so the window read here never contains it.
const FINISHED_MARKER: &str = "Finished: ";

/// Assembles the canonical record for one completed build. All-or-nothing:
/// a failed log fetch yields `Err` and no partial record; missing branch,
/// commit, result, or pipeline source degrade individual fields instead.
pub fn build(run: &dyn BuildExecution, env: &Environment) -> Result<BuildRecord, String> {
    let status = run.result().unwrap_or(BuildStatus::Success);
    let branch = env.branch().unwrap_or("unknown").to_string();
    let commit = env.commit().unwrap_or("unknown").to_string();

    let raw = run.log_tail(LOG_TAIL_LINES)?.join("\n");
    let mut logs = sanitize(&raw);
    if !logs.contains(FINISHED_MARKER) {
        logs.push_str(&format!("\n{FINISHED_MARKER}{status}"));
    }

    let workflow_content =
        locator::locate(run).unwrap_or_else(|| format!("{FALLBACK_PREFIX}\n\n{logs}"));

    Ok(BuildRecord {
        repository: run.job_name().to_string(),
        status,
        build_number: run.number().to_string(),
        branch,
        commit,
        workflow_content,
        jobs: vec![JobRecord {
            name: "Build".to_string(),
            status,
            logs,
        }],
    })
}
