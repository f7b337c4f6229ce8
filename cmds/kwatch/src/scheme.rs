//! Registry of the resource types kwatch can decode.
//!
//! The [`Scheme`] knows two things: which exact group/version/kind triples have a
//! concrete type behind them, and in which order versions should be preferred when
//! a cluster serves more than one version of a kind.

use std::collections::HashSet;

use indexmap::IndexMap;
use k8s_openapi::api::{
	apps::v1 as apps_v1, autoscaling::v1 as autoscaling_v1, autoscaling::v2 as autoscaling_v2,
	batch::v1 as batch_v1, core::v1 as core_v1, networking::v1 as networking_v1,
	policy::v1 as policy_v1, rbac::v1 as rbac_v1,
};
use kube::core::{GroupVersion, GroupVersionKind};
use thiserror::Error;

use crate::{
	config::SchemeConfig,
	k8s::{parse_group_version, ParseGroupVersionError},
};

/// Errors that can occur while building a scheme.
#[derive(Debug, Error)]
pub enum SchemeError {
	#[error("version priority must list at least one version")]
	EmptyVersionPriority,

	#[error("version priority mixes groups: expected {expected:?}, found {found:?}")]
	MixedGroups { expected: String, found: String },

	#[error("invalid apiVersion for extra kind {kind}")]
	InvalidApiVersion {
		kind: String,
		#[source]
		source: ParseGroupVersionError,
	},
}

/// The queries the resource list reconciler needs from a type registry.
pub trait TypeRegistry {
	/// Whether this exact group/version/kind has a concrete type behind it.
	fn recognizes(&self, gvk: &GroupVersionKind) -> bool;

	/// Version preference across all groups, most preferred first.
	///
	/// This is a single list shared by every group. Consumers compare versions
	/// against it without looking at the group.
	fn prioritized_versions_all_groups(&self) -> Vec<GroupVersion>;
}

/// In-memory type registry.
#[derive(Debug, Clone, Default)]
pub struct Scheme {
	known_kinds: HashSet<GroupVersionKind>,
	/// Explicit version priority per group, groups in the order they were first set.
	version_priority: IndexMap<String, Vec<String>>,
	/// Every group-version a type was registered under, in registration order.
	observed_versions: Vec<GroupVersion>,
}

impl Scheme {
	pub fn new() -> Self {
		Self::default()
	}

	/// Scheme with every built-in `k8s-openapi` type kwatch decodes.
	pub fn builtin() -> Self {
		let mut scheme = Self::new();

		scheme.add_known_type::<core_v1::Pod>();
		scheme.add_known_type::<core_v1::ReplicationController>();
		scheme.add_known_type::<core_v1::Service>();
		scheme.add_known_type::<core_v1::ServiceAccount>();
		scheme.add_known_type::<core_v1::Secret>();
		scheme.add_known_type::<core_v1::PersistentVolumeClaim>();
		scheme.add_known_type::<core_v1::ConfigMap>();
		scheme.add_known_type::<core_v1::Namespace>();

		scheme.add_known_type::<apps_v1::Deployment>();
		scheme.add_known_type::<apps_v1::DaemonSet>();
		scheme.add_known_type::<apps_v1::StatefulSet>();
		scheme.add_known_type::<apps_v1::ReplicaSet>();

		scheme.add_known_type::<batch_v1::Job>();
		scheme.add_known_type::<batch_v1::CronJob>();

		scheme.add_known_type::<networking_v1::Ingress>();
		scheme.add_known_type::<networking_v1::NetworkPolicy>();

		scheme.add_known_type::<rbac_v1::Role>();
		scheme.add_known_type::<rbac_v1::ClusterRole>();
		scheme.add_known_type::<rbac_v1::RoleBinding>();
		scheme.add_known_type::<rbac_v1::ClusterRoleBinding>();

		scheme.add_known_type::<autoscaling_v2::HorizontalPodAutoscaler>();
		scheme.add_known_type::<autoscaling_v1::HorizontalPodAutoscaler>();

		scheme.add_known_type::<policy_v1::PodDisruptionBudget>();

		// The versions list is never empty and all entries share one group.
		scheme.version_priority.insert(
			"autoscaling".to_string(),
			vec!["v2".to_string(), "v1".to_string()],
		);

		scheme
	}

	/// Register a typed resource.
	pub fn add_known_type<K: k8s_openapi::Resource>(&mut self) {
		self.add_known_kind(GroupVersionKind::gvk(K::GROUP, K::VERSION, K::KIND));
	}

	/// Register a group/version/kind triple.
	pub fn add_known_kind(&mut self, gvk: GroupVersionKind) {
		let gv = GroupVersion::gv(&gvk.group, &gvk.version);
		if !self.observed_versions.contains(&gv) {
			self.observed_versions.push(gv);
		}
		self.known_kinds.insert(gvk);
	}

	/// Set the version priority of a group, most preferred first.
	///
	/// All entries must belong to the same group. Setting the priority of a group
	/// again replaces its versions but keeps the group's position.
	pub fn set_version_priority(&mut self, versions: &[GroupVersion]) -> Result<(), SchemeError> {
		let Some(first) = versions.first() else {
			return Err(SchemeError::EmptyVersionPriority);
		};
		if let Some(other) = versions.iter().find(|gv| gv.group != first.group) {
			return Err(SchemeError::MixedGroups {
				expected: first.group.clone(),
				found: other.group.clone(),
			});
		}

		self.version_priority.insert(
			first.group.clone(),
			versions.iter().map(|gv| gv.version.clone()).collect(),
		);
		Ok(())
	}

	/// Add the extra kinds and version priorities from configuration.
	pub fn extend_from_config(&mut self, config: &SchemeConfig) -> Result<(), SchemeError> {
		for extra in &config.extra_kinds {
			let gv = parse_group_version(&extra.api_version).map_err(|source| {
				SchemeError::InvalidApiVersion {
					kind: extra.kind.clone(),
					source,
				}
			})?;
			self.add_known_kind(GroupVersionKind::gvk(&gv.group, &gv.version, &extra.kind));
		}

		for priority in &config.version_priority {
			let versions: Vec<GroupVersion> = priority
				.versions
				.iter()
				.map(|version| GroupVersion::gv(&priority.group, version))
				.collect();
			self.set_version_priority(&versions)?;
		}
		Ok(())
	}

	/// Number of registered group/version/kind triples.
	pub fn len(&self) -> usize {
		self.known_kinds.len()
	}

	pub fn is_empty(&self) -> bool {
		self.known_kinds.is_empty()
	}
}

impl TypeRegistry for Scheme {
	fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
		self.known_kinds.contains(gvk)
	}

	fn prioritized_versions_all_groups(&self) -> Vec<GroupVersion> {
		let mut out: Vec<GroupVersion> = self
			.version_priority
			.iter()
			.flat_map(|(group, versions)| {
				versions
					.iter()
					.map(move |version| GroupVersion::gv(group, version))
			})
			.collect();

		for observed in &self.observed_versions {
			if !out.contains(observed) {
				out.push(observed.clone());
			}
		}
		out
	}
}
