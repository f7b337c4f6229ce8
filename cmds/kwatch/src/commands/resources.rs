//! Resources command handler.
//!
//! Lists the cluster's resource types that kwatch would watch: one entry per
//! group and kind, at the preferred version.

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::instrument;

use super::util::{write_rows, OutputFormat};
use crate::{
	config::KwatchConfig,
	k8s::{client::ClusterConnection, discovery::ClusterDiscovery},
	reconcile::{reconcile_resource_list, ResourceDescriptor},
};

#[derive(Args)]
pub struct ResourcesArgs {
	/// Kubeconfig context to use. Overrides the context from the config file
	#[arg(long)]
	pub context: Option<String>,

	/// Path to a config file. Defaults to the nearest .kwatch.yaml
	#[arg(long)]
	pub config: Option<PathBuf>,

	/// Output format
	#[arg(short = 'o', long, value_enum, default_value_t)]
	pub output: OutputFormat,
}

/// Run the resources command.
pub fn run<W: Write>(args: ResourcesArgs, writer: W) -> Result<()> {
	let runtime = tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.context("creating tokio runtime")?;
	runtime.block_on(run_async(args, writer))
}

async fn run_async<W: Write>(args: ResourcesArgs, mut writer: W) -> Result<()> {
	let config = KwatchConfig::load(args.config.as_deref())?;
	let context = args.context.as_deref().or(config.context.as_deref());

	let connection = ClusterConnection::from_context(context)
		.await
		.context("connecting to cluster")?;

	let resources = watched_resources(&connection, &config).await?;
	write_resources(&mut writer, args.output, &resources)
}

/// Discover and reconcile the resource types of the connected cluster.
///
/// The result is sorted by group, then kind.
#[instrument(skip_all, fields(cluster = %connection.cluster_identifier()))]
pub async fn watched_resources(
	connection: &ClusterConnection,
	config: &KwatchConfig,
) -> Result<Vec<ResourceDescriptor>> {
	let scheme = config.build_scheme()?;
	let kinds = config.supported_kinds();

	let discovery = ClusterDiscovery::fetch(connection.client())
		.await
		.context("discovering API resources")?;

	let mut resources = reconcile_resource_list(&discovery, &scheme, &kinds)
		.context("reconciling resource list")?;
	resources.sort_by_key(ResourceDescriptor::group_kind);

	tracing::info!(
		server_version = %connection.server_version().git_version,
		count = resources.len(),
		"resolved watched resources"
	);

	Ok(resources)
}

/// Print resources in the requested format.
pub fn write_resources<W: Write>(
	writer: &mut W,
	format: OutputFormat,
	resources: &[ResourceDescriptor],
) -> Result<()> {
	write_rows(
		writer,
		format,
		resources,
		["GROUP", "VERSION", "KIND", "NAME", "NAMESPACED"],
		|r| {
			[
				if r.group.is_empty() {
					"core".to_string()
				} else {
					r.group.clone()
				},
				r.version.clone(),
				r.kind.clone(),
				r.name.clone(),
				r.namespaced.to_string(),
			]
		},
	)
}
