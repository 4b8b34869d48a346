#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "hsdraw", about = "HSD .dat archive inspection tools")]
struct Cli {
	/// Log parse phases and index sizes to stderr.
	#[arg(short, long, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Header fields and section boundaries.
	Info(cmd::info::Args),
	/// Root and reference nodes with their struct/label role.
	Nodes(cmd::nodes::Args),
	/// Structures reached from the struct nodes.
	Structs(cmd::structs::Args),
	/// Pointer targets no walk from the roots reaches.
	Orphans(cmd::orphans::Args),
	/// Verify the image re-serializes byte for byte.
	Check(cmd::check::Args),
}

fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match run(cli.command) {
		Ok(true) => {}
		Ok(false) => std::process::exit(1),
		Err(err) => {
			eprintln!("error: {err}");
			std::process::exit(1);
		}
	}
}

fn init_tracing(verbose: bool) {
	let filter = if verbose {
		EnvFilter::new("hsdraw=debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hsdraw=warn"))
	};
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Run one command; `Ok(false)` means it completed but found a problem.
fn run(command: Commands) -> hsdraw::dat::Result<bool> {
	match command {
		Commands::Info(args) => cmd::info::run(args).map(|()| true),
		Commands::Nodes(args) => cmd::nodes::run(args).map(|()| true),
		Commands::Structs(args) => cmd::structs::run(args).map(|()| true),
		Commands::Orphans(args) => cmd::orphans::run(args).map(|()| true),
		Commands::Check(args) => cmd::check::run(args),
	}
}
