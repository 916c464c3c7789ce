#![allow(missing_docs)]

use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "keyarchive", about = "Keyed-archive plist encoding tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Archive a JSON value graph into a plist.
	Archive(cmd::archive::Args),
	/// Print the assembled archive envelope as JSON.
	Envelope(cmd::envelope::Args),
}

fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> keyarchive::archive::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Archive(args) => cmd::archive::run(args),
		Commands::Envelope(args) => cmd::envelope::run(args),
	}
}
