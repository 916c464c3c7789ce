use std::path::PathBuf;

use keyarchive::archive::{KeyedArchiver, Result};

use crate::cmd::util::{emit_json, load_graph, node_to_json};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
}

/// Encode a JSON value graph and print the assembled envelope as JSON.
pub fn run(args: Args) -> Result<()> {
	let Args { path } = args;

	let (registry, root) = load_graph(&path)?;
	let mut archiver = KeyedArchiver::new(&registry);
	archiver.encode_root(&root)?;
	let envelope = archiver.finish()?;

	emit_json(&node_to_json(&envelope));
	Ok(())
}
