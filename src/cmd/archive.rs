use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use keyarchive::archive::{OutputFormat, Result, archive_value};

use crate::cmd::util::{emit_json, load_graph};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long, value_enum, default_value_t = FormatArg::Xml)]
	pub format: FormatArg,
	#[arg(long)]
	pub output: Option<PathBuf>,
	#[arg(long)]
	pub json: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum FormatArg {
	Xml,
	Binary,
}

#[derive(serde::Serialize)]
struct ArchiveJson {
	path: String,
	format: &'static str,
	bytes: usize,
	output: Option<String>,
}

/// Archive a JSON value graph and write the plist bytes.
pub fn run(args: Args) -> Result<()> {
	let Args { path, format, output, json } = args;

	let (registry, root) = load_graph(&path)?;
	let (output_format, format_label) = match format {
		FormatArg::Xml => (OutputFormat::Xml, "xml"),
		FormatArg::Binary => (OutputFormat::Binary, "binary"),
	};
	let bytes = archive_value(&registry, &root, output_format)?;

	match &output {
		Some(dest) => fs::write(dest, &bytes)?,
		None if json => {}
		None => std::io::stdout().write_all(&bytes)?,
	}

	if json {
		let payload = ArchiveJson {
			path: path.display().to_string(),
			format: format_label,
			bytes: bytes.len(),
			output: output.map(|dest| dest.display().to_string()),
		};
		emit_json(&payload);
	}

	Ok(())
}
