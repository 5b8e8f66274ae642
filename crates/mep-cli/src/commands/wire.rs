use std::io::{self, Write};

use anyhow::{bail, Result};
use mep_cli::cli::{OutputFormat, WireCommands};
use mep_core::sizing::CONTINUOUS_LOAD_FACTOR;
use mep_core::{find_minimum_wire_size, validate_wire_size, Amperes, WireGauge};
use tabwriter::TabWriter;
use tracing::info;

use super::util::print_json;

pub fn handle(command: &WireCommands) -> Result<()> {
    match command {
        WireCommands::Check {
            size,
            amps,
            continuous,
            format,
        } => {
            info!("Checking {} against {}A", size, amps);
            let check = validate_wire_size(size, *amps, *continuous)?;
            match format {
                OutputFormat::Json => print_json(&check)?,
                OutputFormat::Plain => {
                    println!("Wire size : {}", check.wire_size);
                    println!("Ampacity  : {}", check.ampacity);
                    if check.continuous_load {
                        println!(
                            "Required  : {} ({}A continuous × {})",
                            check.required_ampacity, amps, CONTINUOUS_LOAD_FACTOR
                        );
                    } else {
                        println!("Required  : {}", check.required_ampacity);
                    }
                    println!("Result    : {}", if check.valid { "OK" } else { "UNDERSIZED" });
                    println!("{}", check.message);
                }
            }
            Ok(())
        }
        WireCommands::Min { amps, continuous } => {
            if !amps.is_finite() || *amps <= 0.0 {
                bail!("amperage must be a positive number");
            }
            let factor = if *continuous { CONTINUOUS_LOAD_FACTOR } else { 1.0 };
            let required = Amperes(*amps) * factor;
            let gauge = find_minimum_wire_size(required);
            println!("{gauge} ({}) for {required}", gauge.ampacity());
            if gauge.ampacity() < required {
                println!(
                    "Load exceeds the largest tabulated conductor; parallel runs need engineering review"
                );
            }
            Ok(())
        }
        WireCommands::Table => {
            let mut writer = TabWriter::new(io::stdout());
            writeln!(writer, "SIZE\tAMPACITY (75°C Cu)\tAREA (THHN)")?;
            for gauge in WireGauge::ALL {
                writeln!(writer, "{}\t{}\t{}", gauge, gauge.ampacity(), gauge.area())?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}
