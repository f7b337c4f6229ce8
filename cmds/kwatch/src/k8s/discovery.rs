//! Kubernetes API resource discovery.
//!
//! This module fetches the raw per-group-version resource lists from the
//! cluster's legacy discovery endpoints. Every served version of every group
//! is listed, not just the preferred one, so that the reconciler can pick the
//! version kwatch prefers.

use std::sync::Arc;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::Client;
use thiserror::Error;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::instrument;

/// Errors that can occur during API resource discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
	#[error("failed to list core API versions")]
	CoreVersions(#[source] kube::Error),

	#[error("failed to list API groups")]
	ApiGroups(#[source] kube::Error),

	#[error("discovery task panicked")]
	TaskPanicked(#[source] tokio::task::JoinError),

	#[error(
		"unable to retrieve the complete list of server APIs: {}",
		describe_failed(.0)
	)]
	GroupDiscoveryFailed(Vec<FailedGroupVersion>),
}

/// A group-version whose resource list could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedGroupVersion {
	pub group_version: String,
	pub message: String,
}

fn describe_failed(failed: &[FailedGroupVersion]) -> String {
	failed
		.iter()
		.map(|f| format!("{}: {}", f.group_version, f.message))
		.collect::<Vec<_>>()
		.join(", ")
}

/// Source of the raw resource lists the cluster serves.
pub trait DiscoverySource {
	/// All group-versions with their resource entries, in discovery order.
	fn server_groups_and_resources(&self) -> Result<Vec<APIResourceList>, DiscoveryError>;
}

/// Discovery results fetched from a live cluster.
///
/// Fetching happens once, up front. Group-versions that failed to list are kept
/// alongside the successful ones, and reported as an error when the resource
/// lists are requested.
#[derive(Debug, Clone)]
pub struct ClusterDiscovery {
	resource_lists: Vec<APIResourceList>,
	failed: Vec<FailedGroupVersion>,
}

/// A discovery endpoint to query.
#[derive(Debug, Clone)]
enum Target {
	/// `/api/{version}`
	Core(String),
	/// `/apis/{group}/{version}`
	Group(String),
}

impl Target {
	fn group_version(&self) -> &str {
		match self {
			Target::Core(gv) | Target::Group(gv) => gv,
		}
	}
}

impl ClusterDiscovery {
	/// Maximum concurrent resource list requests.
	const MAX_CONCURRENT_DISCOVERIES: usize = 8;

	/// Fetch every group-version's resource list.
	///
	/// Failing to list the core versions or the API groups is fatal. Failures of
	/// individual group-versions are collected.
	#[instrument(skip(client))]
	pub async fn fetch(client: &Client) -> Result<Self, DiscoveryError> {
		let core = client
			.list_core_api_versions()
			.await
			.map_err(DiscoveryError::CoreVersions)?;
		let groups = client
			.list_api_groups()
			.await
			.map_err(DiscoveryError::ApiGroups)?;

		let targets: Vec<Target> = core
			.versions
			.into_iter()
			.map(Target::Core)
			.chain(groups.groups.into_iter().flat_map(|group| {
				group
					.versions
					.into_iter()
					.map(|version| Target::Group(version.group_version))
			}))
			.collect();

		tracing::debug!(count = targets.len(), "fetching resource lists");

		let semaphore = Arc::new(Semaphore::new(Self::MAX_CONCURRENT_DISCOVERIES));
		let mut join_set = JoinSet::new();

		for (index, target) in targets.into_iter().enumerate() {
			let client = client.clone();
			let sem = semaphore.clone();

			join_set.spawn(async move {
				let _permit = sem.acquire().await.expect("semaphore closed");

				tracing::trace!(group_version = %target.group_version(), "listing resources");

				let result = match &target {
					Target::Core(version) => client.list_core_api_resources(version).await,
					Target::Group(gv) => client.list_api_group_resources(gv).await,
				};
				(index, target, result)
			});
		}

		let mut fetched = Vec::new();
		let mut failed = Vec::new();

		while let Some(joined) = join_set.join_next().await {
			let (index, target, result) = joined.map_err(DiscoveryError::TaskPanicked)?;
			match result {
				Ok(list) => fetched.push((index, list)),
				Err(e) => {
					tracing::warn!(
						group_version = %target.group_version(),
						error = %e,
						"failed to list resources"
					);
					failed.push((
						index,
						FailedGroupVersion {
							group_version: target.group_version().to_string(),
							message: e.to_string(),
						},
					));
				}
			}
		}

		// Requests complete out of order, restore the order the server listed them in
		fetched.sort_by_key(|(index, _)| *index);
		failed.sort_by_key(|(index, _)| *index);

		Ok(Self {
			resource_lists: fetched.into_iter().map(|(_, list)| list).collect(),
			failed: failed.into_iter().map(|(_, f)| f).collect(),
		})
	}

	/// Resource lists that were fetched successfully.
	pub fn resource_lists(&self) -> &[APIResourceList] {
		&self.resource_lists
	}

	/// Group-versions that could not be listed.
	pub fn failed_group_versions(&self) -> &[FailedGroupVersion] {
		&self.failed
	}
}

impl DiscoverySource for ClusterDiscovery {
	fn server_groups_and_resources(&self) -> Result<Vec<APIResourceList>, DiscoveryError> {
		if !self.failed.is_empty() {
			return Err(DiscoveryError::GroupDiscoveryFailed(self.failed.clone()));
		}
		Ok(self.resource_lists.clone())
	}
}
