//! Kinds command handler.

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::util::{write_rows, OutputFormat};
use crate::config::KwatchConfig;

#[derive(Args)]
pub struct KindsArgs {
	/// Path to a config file. Defaults to the nearest .kwatch.yaml
	#[arg(long)]
	pub config: Option<PathBuf>,

	/// Output format
	#[arg(short = 'o', long, value_enum, default_value_t)]
	pub output: OutputFormat,
}

#[derive(Serialize)]
struct KindRow<'a> {
	kind: &'a str,
}

/// Run the kinds command.
pub fn run<W: Write>(args: KindsArgs, mut writer: W) -> Result<()> {
	let config = KwatchConfig::load(args.config.as_deref())?;
	write_kinds(&mut writer, args.output, &config)
}

/// Print the object kinds kwatch matches resources against.
fn write_kinds<W: Write>(writer: &mut W, format: OutputFormat, config: &KwatchConfig) -> Result<()> {
	let supported = config.supported_kinds();
	// Catch typos before printing anything
	supported.matcher()?;

	let rows: Vec<_> = supported
		.kinds()
		.iter()
		.map(|kind| KindRow { kind })
		.collect();
	write_rows(writer, format, &rows, ["KIND"], |row| [row.kind.to_string()])
}
