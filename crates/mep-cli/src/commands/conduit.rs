use std::io::{self, Write};

use anyhow::{Context, Result};
use mep_cli::cli::{ConduitCommands, OutputFormat};
use mep_core::{validate_conduit_fill, Conductor, ConduitSize};
use tabwriter::TabWriter;
use tracing::info;

use super::util::print_json;

pub fn handle(command: &ConduitCommands) -> Result<()> {
    match command {
        ConduitCommands::Fill {
            size,
            wires,
            format,
        } => {
            let conductors = wires
                .iter()
                .map(|spec| parse_conductor(spec))
                .collect::<Result<Vec<_>>>()?;
            info!("Checking fill of {} conduit with {} conductor group(s)", size, conductors.len());
            let check = validate_conduit_fill(size, &conductors)?;
            match format {
                OutputFormat::Json => print_json(&check)?,
                OutputFormat::Plain => {
                    println!("Conduit     : {}", check.conduit_size);
                    println!("Conductors  : {}", check.conductor_count);
                    println!("Wire area   : {}", check.conductor_area);
                    println!("Usable area : {}", check.usable_area);
                    println!(
                        "Fill        : {:.1}% (max {}%)",
                        check.fill_percentage, check.max_fill_percentage
                    );
                    println!("Result      : {}", if check.valid { "OK" } else { "OVERFILLED" });
                    println!("{}", check.message);
                    if let Some(warning) = &check.warning {
                        println!("Note: {warning}");
                    }
                }
            }
            Ok(())
        }
        ConduitCommands::Table => {
            let mut writer = TabWriter::new(io::stdout());
            writeln!(writer, "TRADE SIZE\tUSABLE AREA (EMT)")?;
            for size in ConduitSize::ALL {
                writeln!(writer, "{}\t{}", size, size.usable_area())?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}

/// `3x10AWG`, `3 x 10 AWG`, `2*1/0` or a bare size meaning one conductor.
fn parse_conductor(spec: &str) -> Result<Conductor> {
    let trimmed = spec.trim();
    let split = trimmed.find(['x', 'X', '*']).and_then(|pos| {
        let count = trimmed[..pos].trim();
        (!count.is_empty() && count.chars().all(|c| c.is_ascii_digit()))
            .then(|| (count, trimmed[pos + 1..].trim()))
    });
    let (count, size) = match split {
        Some((count, size)) => (
            count
                .parse::<u32>()
                .with_context(|| format!("conductor count in '{spec}'"))?,
            size,
        ),
        None => (1, trimmed),
    };
    Conductor::from_label(size, count).with_context(|| format!("parsing conductor '{spec}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mep_core::WireGauge;

    #[test]
    fn conductor_specs() {
        assert_eq!(
            parse_conductor("3x10AWG").unwrap(),
            Conductor::new(WireGauge::Awg10, 3)
        );
        assert_eq!(
            parse_conductor("2 x 1/0 AWG").unwrap(),
            Conductor::new(WireGauge::Awg1_0, 2)
        );
        assert_eq!(
            parse_conductor("250 kcmil").unwrap(),
            Conductor::new(WireGauge::Kcmil250, 1)
        );
        assert!(parse_conductor("3x13 AWG").is_err());
    }
}
