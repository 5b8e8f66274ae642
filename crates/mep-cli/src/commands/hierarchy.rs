use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use mep_cli::cli::{HierarchyCommands, OutputFormat};
use mep_cli::MepConfig;
use mep_core::{
    assign_levels, build_hierarchy_graph, export_graph, validate_survey, EquipmentNode,
    ValidationConfig,
};
use mep_survey::Project;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::util::{print_json, print_report_table};

pub fn handle(command: &HierarchyCommands, config: &MepConfig) -> Result<()> {
    match command {
        HierarchyCommands::Validate {
            input,
            no_installation,
            strict,
            format,
        } => {
            let nodes = load_equipment(input)?;
            let validation = ValidationConfig {
                check_installation: config.validation.check_installation && !no_installation,
                ..config.validation
            };
            info!("Validating {} equipment node(s) from {}", nodes.len(), input.display());
            let report = validate_survey(&nodes, &validation);
            let stats = build_hierarchy_graph(&nodes).stats();

            match format {
                OutputFormat::Json => {
                    #[derive(Serialize)]
                    #[serde(rename_all = "camelCase")]
                    struct Output<'a> {
                        equipment: usize,
                        roots: usize,
                        max_depth: u32,
                        can_save: bool,
                        summary: String,
                        report: &'a mep_core::HierarchyReport,
                    }
                    print_json(&Output {
                        equipment: stats.node_count,
                        roots: stats.root_count,
                        max_depth: stats.max_depth,
                        can_save: report.can_save(),
                        summary: report.summary(),
                        report: &report,
                    })?;
                }
                OutputFormat::Plain => {
                    println!("Hierarchy for {}:", input.display());
                    println!("  Equipment : {}", stats.node_count);
                    println!("  Roots     : {}", stats.root_count);
                    println!("  Max depth : {}", stats.max_depth);
                    if stats.has_cycle {
                        println!("  Cycle     : yes");
                    }
                    println!("  Result    : {}", report.summary());
                    println!();
                    print_report_table(&report)?;
                }
            }

            if *strict && report.has_errors() {
                bail!("{} error-severity issue(s) found", report.error_count());
            }
            Ok(())
        }
        HierarchyCommands::Graph { input, format, out } => {
            let nodes = load_equipment(input)?;
            let rendered = match format.to_ascii_lowercase().as_str() {
                "tree" => build_hierarchy_graph(&nodes).render_tree(),
                other => export_graph(&nodes, other)?,
            };
            match out {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(path, &rendered)
                        .with_context(|| format!("writing '{}'", path.display()))?;
                    println!("Wrote hierarchy graph to {}", path.display());
                }
                None => {
                    print!("{rendered}");
                    if !rendered.ends_with('\n') {
                        println!();
                    }
                }
            }
            Ok(())
        }
    }
}

/// Read a bare JSON array of nodes, `{"equipment": [...]}`, or a saved project.
///
/// Levels are recomputed from the parent links, so files may omit them.
pub fn load_equipment(path: &Path) -> Result<Vec<EquipmentNode>> {
    let nodes = read_equipment(path)?;
    Ok(assign_levels(&nodes))
}

fn read_equipment(path: &Path) -> Result<Vec<EquipmentNode>> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))?;
    let value: Value = serde_json::from_str(&data)
        .with_context(|| format!("parsing '{}' as JSON", path.display()))?;
    let is_project = value.get("createdAt").is_some();
    match value {
        Value::Array(_) => serde_json::from_value(value)
            .with_context(|| format!("parsing equipment list in '{}'", path.display())),
        Value::Object(_) if is_project => {
            let project: Project = serde_json::from_value(value)
                .with_context(|| format!("parsing project '{}'", path.display()))?;
            Ok(project.nodes())
        }
        Value::Object(mut map) => {
            let equipment = map
                .remove("equipment")
                .ok_or_else(|| anyhow!("'{}' has no equipment array", path.display()))?;
            serde_json::from_value(equipment)
                .with_context(|| format!("parsing equipment list in '{}'", path.display()))
        }
        _ => bail!("'{}' is not an equipment list", path.display()),
    }
}
