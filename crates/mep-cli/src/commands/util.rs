use anyhow::Result;
use mep_core::HierarchyReport;
use serde::Serialize;
use std::io::{self, Write};
use tabwriter::TabWriter;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer_pretty(io::stdout(), value)
        .map_err(|err| anyhow::anyhow!("serializing output to JSON: {err}"))?;
    println!();
    Ok(())
}

/// Issue table, errors first.
pub fn print_report_table(report: &HierarchyReport) -> Result<()> {
    if report.total() == 0 {
        println!("No hierarchy issues found.");
        return Ok(());
    }
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SEVERITY\tTYPE\tEQUIPMENT\tMESSAGE")?;
    for (severity, issue) in report.iter() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            severity.as_str(),
            issue.kind,
            issue.equipment_id,
            issue.message
        )?;
        if let Some(action) = &issue.suggested_action {
            writeln!(writer, "\t\t\t→ {action}")?;
        }
    }
    writer.flush()?;
    Ok(())
}
