// The `osintbox version` command.

use colored::Colorize;

/// Prints the version baked in at compile time. Goes to stdout (not the
/// log stream) so it is trivially scriptable.
pub fn run() {
    println!(
        "{} {}",
        env!("CARGO_PKG_NAME").bold(),
        env!("CARGO_PKG_VERSION")
    );
}
