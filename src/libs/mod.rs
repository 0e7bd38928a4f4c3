// Internal plumbing shared by the commands: path resolution, catalog
// loading, state persistence, the environment-settings record, and the
// step-outcome handling the orchestrator is built on.

pub mod config_loading;
pub mod environment;
pub mod paths;
pub mod state_management;
pub mod steps;
