use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use mep_cli::cli::{OutputFormat, SurveyCommands};
use mep_cli::config::resolve_store_dir;
use mep_cli::MepConfig;
use mep_core::{GapSummary, HierarchyReport};
use mep_survey::{
    load_script_from_path, JsonFileRepository, Project, ProjectRepository, SaveOutcome,
    ScriptedService, Survey, SurveyItem, SurveyStage,
};
use serde::Serialize;
use tabwriter::TabWriter;
use tracing::info;

use super::util::{print_json, print_report_table};

pub fn handle(command: &SurveyCommands, config: &MepConfig) -> Result<()> {
    match command {
        SurveyCommands::Run {
            script,
            project,
            store,
            dry_run,
            format,
        } => {
            let store = store_dir(store.as_deref(), config)?;
            run_script(script, project.as_deref(), &store, *dry_run, *format, config)
        }
        SurveyCommands::Show {
            project,
            store,
            format,
        } => {
            let repo = JsonFileRepository::new(store_dir(store.as_deref(), config)?);
            if !repo.list()?.iter().any(|id| id == project) {
                return Err(anyhow!(
                    "project '{}' not found in {}",
                    project,
                    repo.root().display()
                ));
            }
            let stored = repo.load(project)?;
            match format {
                OutputFormat::Json => print_json(&stored),
                OutputFormat::Plain => print_project(&stored),
            }
        }
        SurveyCommands::List { store } => {
            let repo = JsonFileRepository::new(store_dir(store.as_deref(), config)?);
            let ids = repo.list()?;
            if ids.is_empty() {
                println!("No projects in {}", repo.root().display());
                return Ok(());
            }
            let mut writer = TabWriter::new(io::stdout());
            writeln!(writer, "PROJECT\tEQUIPMENT\tUPDATED")?;
            for id in ids {
                let project = repo.load(&id)?;
                writeln!(
                    writer,
                    "{}\t{}\t{}",
                    project.id,
                    project.summary.total_equipment,
                    project.updated_at.to_rfc3339()
                )?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}

fn store_dir(explicit: Option<&Path>, config: &MepConfig) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => resolve_store_dir(&config.data),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunOutput<'a> {
    project_id: &'a str,
    stage: SurveyStage,
    items: &'a [SurveyItem],
    report: &'a HierarchyReport,
    gaps: Option<GapSummary>,
    can_save: bool,
    saved: Option<&'a SaveOutcome>,
}

fn run_script(
    path: &Path,
    project: Option<&str>,
    store: &Path,
    dry_run: bool,
    format: OutputFormat,
    config: &MepConfig,
) -> Result<()> {
    let script = load_script_from_path(path)?;
    let project_id = project
        .map(str::to_string)
        .or_else(|| script.project_id.clone())
        .ok_or_else(|| anyhow!("no project id: pass --project or set project_id in the script"))?;
    let service = ScriptedService::from_script(&script);

    let mut survey = Survey::new(project_id.clone(), config.validation);
    if let Some(name) = &script.project_name {
        survey = survey.with_project_name(name.clone());
    }
    for image in service.images() {
        survey.add_image(image)?;
    }

    survey.classify(&service)?;
    let analysis = survey.analyze(&service)?;
    info!(
        "{} image(s) extracted, {} skipped",
        analysis.extracted, analysis.skipped
    );
    survey.proceed_to_user_inputs()?;

    loop {
        let Some(name) = survey.current_item().map(|item| item.image.name.clone()) else {
            break;
        };
        let inputs = service
            .inputs_for(&name)
            .cloned()
            .ok_or_else(|| anyhow!("no user_inputs scripted for '{name}'"))?;
        survey
            .submit_inputs(inputs)
            .with_context(|| format!("user inputs for '{name}'"))?;
    }
    if survey.stage() != SurveyStage::Review {
        return Err(anyhow!("survey stopped at {}", survey.stage()));
    }

    for edit in &script.edits {
        info!(target_id = %edit.target(), "applying review edit");
        survey.apply_edit(edit.clone())?;
    }

    let save_result = if dry_run {
        Ok(None)
    } else {
        let mut repo = JsonFileRepository::new(store);
        survey.save(&mut repo).map(Some)
    };
    let saved = save_result.as_ref().ok().cloned().flatten();

    match format {
        OutputFormat::Json => print_json(&RunOutput {
            project_id: &project_id,
            stage: survey.stage(),
            items: survey.items(),
            report: survey.report(),
            gaps: survey.gap_summary(),
            can_save: survey.report().can_save(),
            saved: saved.as_ref(),
        })?,
        OutputFormat::Plain => {
            print_items(survey.items())?;
            println!();
            println!("Review: {}", survey.report().summary());
            print_report_table(survey.report())?;
            if let Some(gaps) = survey.gap_summary() {
                println!();
                print!("{gaps}");
            }
            match &saved {
                Some(outcome) => {
                    println!();
                    println!(
                        "Saved {} item(s) to project {} (sequences {})",
                        outcome.saved,
                        outcome.project_id,
                        outcome
                            .sequences
                            .iter()
                            .map(u32::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                }
                None if dry_run => println!("Dry run: nothing saved"),
                None => {}
            }
        }
    }
    save_result.context("saving survey")?;
    Ok(())
}

fn print_items(items: &[SurveyItem]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "IMAGE\tID\tTYPE\tSTATUS")?;
    for item in items {
        let kind = item
            .equipment_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| item.classification.equipment_type.clone());
        let status = match &item.skip_reason {
            Some(reason) => format!("skipped: {reason}"),
            None => "surveyed".to_string(),
        };
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            item.image.name, item.id, kind, status
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn print_project(project: &Project) -> Result<()> {
    println!("Project {}", project.id);
    if let Some(name) = &project.name {
        println!("  Name       : {name}");
    }
    println!("  Equipment  : {}", project.summary.total_equipment);
    for (kind, count) in &project.summary.by_type {
        println!("    {:<18} {count}", kind.as_str());
    }
    if let Some(confidence) = project.summary.average_confidence {
        println!("  Confidence : {:.0}%", confidence * 100.0);
    }
    println!("  Updated    : {}", project.updated_at.to_rfc3339());
    println!();

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SEQ\tID\tTYPE\tDESIGNATION\tFED FROM\tLEVEL")?;
    for saved in &project.equipment {
        let node = &saved.node;
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            saved.sequence,
            node.id,
            node.equipment_type,
            node.label(),
            node.parent_id.as_ref().map(|p| p.as_str()).unwrap_or("-"),
            node.hierarchy_level
        )?;
    }
    writer.flush()?;
    Ok(())
}
