use crate::execution::BuildExecution;
use std::fs;

/// File name probed at the workspace root.
pub const PIPELINE_FILE: &str = "Jenkinsfile";

/// Finds the textual pipeline definition for a build, trying strategies in
/// order: a `Jenkinsfile` at the workspace root, then the execution's
/// script-source capability. Strategy failures are swallowed; a build with
/// no locatable definition yields `None`.
pub fn locate(run: &dyn BuildExecution) -> Option<String> {
    if let Some(workspace) = run.workspace()
        && let Ok(text) = fs::read_to_string(workspace.join(PIPELINE_FILE))
    {
        return Some(text);
    }

    if let Some(source) = run.script_source()
        && let Ok(script) = source.script()
    {
        return Some(script);
    }

    None
}
