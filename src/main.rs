mod commands;
mod installers;
mod libs;
mod logger;
mod schema;
mod utils;

use clap::{Parser, Subcommand};
use commands::{generate, provision, version};

#[derive(Parser)]
#[command(name = "osintbox")]
#[command(about = "Provision a Debian OSINT workstation with one command", long_about = None)]
struct Cli {
    /// Turn debugging information on
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Provision the machine from the catalog files
    Provision {
        #[arg(long)]
        config: Option<String>,
        #[arg(long)]
        state: Option<String>,
        /// Pull already-cloned repositories instead of skipping them
        #[arg(long)]
        update: bool,
    },
    /// Generate the default tool catalog
    Generate {
        #[arg(long)]
        config_dir: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);

    let exit_code = match cli.command {
        Commands::Version => {
            version::run();
            0
        }
        Commands::Provision {
            config,
            state,
            update,
        } => provision::run(config, state, update),
        Commands::Generate { config_dir } => generate::run(config_dir),
    };

    std::process::exit(exit_code);
}
