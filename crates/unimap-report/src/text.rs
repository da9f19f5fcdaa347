use colored::Colorize;

use unimap_core::graph::DirectoryGraph;
use unimap_core::types::{DirectoryRecord, ProjectModel};

/// Format the project model for terminal output.
pub fn format_report(project: &ProjectModel) -> String {
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{}\n", "Unimap - Unity Project Analysis".bold()));
    out.push_str(&format!("{}\n\n", "=".repeat(40)));

    out.push_str(&format!("{}: {}\n", "Project".bold(), project.project_path));
    out.push_str(&format!("{}: {}\n", "Analyzed".bold(), project.analyzed_at));
    out.push_str(&format!(
        "\n{}: {} files, {} types, {} directories\n",
        "Summary".bold(),
        project.total_files,
        project.total_types,
        project.directories.len(),
    ));

    if project.directories.is_empty() {
        out.push_str(&format!("\n{}\n\n", "No C# sources found.".yellow()));
        return out;
    }

    let graph = DirectoryGraph::from_project(project);

    out.push_str(&format!("\n{}\n{}\n", "Directories".bold(), "-".repeat(40)));
    for dir in &project.directories {
        out.push_str(&format_directory(dir, &graph));
    }

    let cycles = graph.find_cycles();
    if cycles.is_empty() {
        out.push_str(&format!("\n{}\n", "No directory cycles found!".green().bold()));
    } else {
        out.push_str(&format!(
            "\n{} ({} found)\n{}\n",
            "Directory Cycles".red().bold(),
            cycles.len(),
            "-".repeat(40),
        ));
        for cycle in &cycles {
            out.push_str(&format!("  {}\n", cycle.join(" <-> ")));
        }
    }

    out.push('\n');
    out
}

fn format_directory(dir: &DirectoryRecord, graph: &DirectoryGraph) -> String {
    let mut out = String::new();

    match &dir.module_name {
        Some(module) => out.push_str(&format!("\n  {} [{}]\n", dir.path.cyan().bold(), module)),
        None => out.push_str(&format!("\n  {}\n", dir.path.cyan().bold())),
    }

    let stats = &dir.stats;
    let buckets = [
        ("MonoBehaviour", stats.mono_behaviours),
        ("ScriptableObject", stats.scriptable_objects),
        ("Interface", stats.interfaces),
        ("Editor", stats.editor_scripts),
        ("PureCSharp", stats.pure_c_sharp),
        ("Enum", stats.enums),
    ];
    let breakdown: Vec<String> = buckets
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| format!("{count} {label}"))
        .collect();
    out.push_str(&format!(
        "    {} scripts, {} types",
        stats.total_scripts,
        stats.type_count()
    ));
    if !breakdown.is_empty() {
        out.push_str(&format!(" ({})", breakdown.join(", ")));
    }
    out.push('\n');

    if !dir.dependencies.referenced_directories.is_empty() {
        out.push_str(&format!(
            "    {}: {}\n",
            "depends on".dimmed(),
            dir.dependencies.referenced_directories.join(", ")
        ));
    }
    let dependents = graph.dependents_of(&dir.path);
    if !dependents.is_empty() {
        out.push_str(&format!(
            "    {}: {}\n",
            "used by".dimmed(),
            dependents.join(", ")
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use unimap_core::types::{DirectoryDependencies, DirectoryStats};

    fn make_dir(path: &str, refs: &[&str]) -> DirectoryRecord {
        DirectoryRecord {
            path: path.to_string(),
            module_name: None,
            files: vec![],
            stats: DirectoryStats {
                total_scripts: 2,
                mono_behaviours: 1,
                enums: 1,
                ..DirectoryStats::default()
            },
            dependencies: DirectoryDependencies {
                uses_namespaces: vec![],
                referenced_directories: refs.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn make_project(dirs: Vec<DirectoryRecord>) -> ProjectModel {
        let mut project = ProjectModel::new("/game/Assets", "2026-03-01T12:00:00Z");
        project.directories = dirs;
        project
    }

    #[test]
    fn test_format_report_lists_directories() {
        colored::control::set_override(false);
        let mut core = make_dir("Core", &[]);
        core.module_name = Some("Game.Core".to_string());
        let project = make_project(vec![core, make_dir("Gameplay", &["Core"])]);

        let report = format_report(&project);
        assert!(report.contains("Core [Game.Core]"));
        assert!(report.contains("2 scripts, 2 types (1 MonoBehaviour, 1 Enum)"));
        assert!(report.contains("depends on: Core"));
        assert!(report.contains("used by: Gameplay"));
        assert!(report.contains("No directory cycles found!"));
    }

    #[test]
    fn test_format_report_shows_cycles() {
        colored::control::set_override(false);
        let project = make_project(vec![make_dir("A", &["B"]), make_dir("B", &["A"])]);
        let report = format_report(&project);
        assert!(report.contains("Directory Cycles (1 found)"));
        assert!(report.contains("A <-> B"));
    }

    #[test]
    fn test_format_report_empty_project() {
        colored::control::set_override(false);
        let report = format_report(&make_project(vec![]));
        assert!(report.contains("0 files, 0 types, 0 directories"));
        assert!(report.contains("No C# sources found."));
    }
}
