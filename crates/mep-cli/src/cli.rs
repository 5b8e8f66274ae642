use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mep",
    author,
    version,
    about = "Electrical survey validation and NEC wiring checks",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Conductor ampacity checks
    Wire {
        #[command(subcommand)]
        command: WireCommands,
    },
    /// Conduit fill checks
    Conduit {
        #[command(subcommand)]
        command: ConduitCommands,
    },
    /// Validate or draw an equipment hierarchy
    Hierarchy {
        #[command(subcommand)]
        command: HierarchyCommands,
    },
    /// Run or inspect nameplate surveys
    Survey {
        #[command(subcommand)]
        command: SurveyCommands,
    },
    /// Manage ~/.mep/config/mep.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum WireCommands {
    /// Check a conductor against a load
    Check {
        /// Wire size label, e.g. "10 AWG", "3/0", "250 kcmil"
        size: String,
        /// Load current in amperes
        #[arg(long)]
        amps: f64,
        /// Apply the 125% continuous-load factor
        #[arg(long)]
        continuous: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Smallest conductor for a load
    Min {
        /// Load current in amperes
        amps: f64,
        /// Apply the 125% continuous-load factor
        #[arg(long)]
        continuous: bool,
    },
    /// Print the ampacity and area table
    Table,
}

#[derive(Subcommand, Debug)]
pub enum ConduitCommands {
    /// Check conductor fill for a conduit trade size
    Fill {
        /// Conduit trade size, e.g. 1/2" or 1-1/4
        size: String,
        /// Conductors as COUNTxSIZE (e.g. 3x10AWG) or SIZE; repeatable
        #[arg(long = "wire", required = true)]
        wires: Vec<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Print the usable-area table
    Table,
}

#[derive(Subcommand, Debug)]
pub enum HierarchyCommands {
    /// Run the hierarchy validator over an equipment list or saved project
    Validate {
        /// JSON array of equipment nodes, or a saved project file
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Skip conduit-fill and wire-ampacity checks
        #[arg(long)]
        no_installation: bool,
        /// Exit with an error when error-severity issues are found
        #[arg(long)]
        strict: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Render the hierarchy as a tree or Graphviz DOT
    Graph {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Output format: tree or dot
        #[arg(long, default_value = "tree")]
        format: String,
        /// Write output to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SurveyCommands {
    /// Replay a survey script through the full workflow and save the result
    Run {
        /// YAML or JSON survey script
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Project id (defaults to the script's project_id)
        #[arg(long)]
        project: Option<String>,
        /// Project store directory (defaults to [data] store_dir)
        #[arg(long, value_hint = ValueHint::DirPath)]
        store: Option<PathBuf>,
        /// Stop at review without saving
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Show a stored project
    Show {
        project: String,
        #[arg(long, value_hint = ValueHint::DirPath)]
        store: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// List stored projects
    List {
        #[arg(long, value_hint = ValueHint::DirPath)]
        store: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the configuration file location
    Path,
}
