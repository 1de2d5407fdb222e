//! Run configuration: command line, environment and an optional TOML file
//! merged into a single [`ScreenPlan`].

mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{Environment, build_plan};
pub use models::{FileSpec, OutputTarget, ScreenPlan};
