pub mod config;
pub mod conduit;
pub mod hierarchy;
pub mod survey;
pub mod util;
pub mod wire;
