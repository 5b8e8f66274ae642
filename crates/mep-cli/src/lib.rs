pub mod cli;
pub mod config;

pub use cli::{
    Cli, Commands, ConduitCommands, ConfigCommands, HierarchyCommands, OutputFormat,
    SurveyCommands, WireCommands,
};
pub use config::MepConfig;
