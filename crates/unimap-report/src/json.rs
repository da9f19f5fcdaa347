use unimap_core::types::ProjectModel;

/// Format the project model as the JSON output document.
pub fn format_report(project: &ProjectModel, compact: bool) -> String {
    if compact {
        serde_json::to_string(project).expect("ProjectModel should be serializable")
    } else {
        serde_json::to_string_pretty(project).expect("ProjectModel should be serializable")
    }
}
