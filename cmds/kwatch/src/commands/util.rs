//! Utilities for command handlers.

use std::io::{self, ErrorKind, Write};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use tabwriter::TabWriter;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
	/// Aligned columns with a header row.
	#[default]
	Table,
	Json,
	Yaml,
}

/// Write `rows` in the requested format.
///
/// `header` and `columns` are only used for table output; JSON and YAML
/// serialize the rows as they are.
pub fn write_rows<W, T, F, const N: usize>(
	writer: &mut W,
	format: OutputFormat,
	rows: &[T],
	header: [&str; N],
	columns: F,
) -> Result<()>
where
	W: Write,
	T: Serialize,
	F: Fn(&T) -> [String; N],
{
	match format {
		OutputFormat::Table => {
			let mut tw = TabWriter::new(&mut *writer);
			writeln!(tw, "{}", header.join("\t"))?;
			for row in rows {
				writeln!(tw, "{}", columns(row).join("\t"))?;
			}
			tw.flush().context("writing table")?;
		}
		OutputFormat::Json => {
			serde_json::to_writer_pretty(&mut *writer, rows).context("serializing JSON")?;
			writeln!(writer)?;
		}
		OutputFormat::Yaml => {
			let yaml = serde_yaml_with_quirks::to_string(rows).context("serializing YAML")?;
			writer.write_all(yaml.as_bytes())?;
		}
	}
	Ok(())
}

/// A writer wrapper that silently handles broken pipe errors.
///
/// Lets commands exit cleanly when output is piped to a process that closes
/// early (e.g., `kwatch resources | head -1`).
pub struct BrokenPipeGuard<W> {
	inner: W,
}

impl<W> BrokenPipeGuard<W> {
	pub fn new(inner: W) -> Self {
		Self { inner }
	}
}

impl<W: Write> Write for BrokenPipeGuard<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		match self.inner.write(buf) {
			Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(buf.len()),
			other => other,
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self.inner.flush() {
			Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
			other => other,
		}
	}
}
