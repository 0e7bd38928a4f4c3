// Register application subcommands.
// Each module corresponds to a specific `osintbox` command-line action.

// Manages the creation of the default catalog files.
pub mod generate;
// Orchestrates the provisioning run.
pub mod provision;
// Displays the version of osintbox.
pub mod version;
