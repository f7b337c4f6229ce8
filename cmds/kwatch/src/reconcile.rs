//! Resource list reconciliation.
//!
//! Turns the raw discovery listing of a cluster into the set of resource types
//! kwatch should watch: one entry per group and kind, restricted to kinds the
//! rules understand and the scheme can decode, at the most preferred version
//! the cluster serves.

use std::collections::{hash_map::Entry, HashMap};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
use kube::{
	core::{GroupVersion, GroupVersionKind},
	discovery::ApiResource,
};
use objectkinds::{SupportedKinds, UnknownObjectKind};
use serde::Serialize;
use thiserror::Error;
use tracing::{instrument, trace};

use crate::{
	k8s::{
		api_version,
		discovery::{DiscoveryError, DiscoverySource},
		parse_group_version, ParseGroupVersionError,
	},
	scheme::TypeRegistry,
};

/// Errors that abort a reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
	#[error(transparent)]
	Discovery(#[from] DiscoveryError),

	#[error(transparent)]
	GroupVersion(#[from] ParseGroupVersionError),

	#[error("failed to construct the object kind matcher")]
	Matcher(#[from] UnknownObjectKind),
}

/// Deduplication identity of a resource type. Versions are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKind {
	pub group: String,
	pub kind: String,
}

/// A discoverable resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
	/// API group, empty for the core group.
	pub group: String,
	pub version: String,
	pub kind: String,
	/// Plural path segment, `pods/status` style for sub-resources.
	pub name: String,
	pub namespaced: bool,
}

impl ResourceDescriptor {
	fn from_api_resource(gv: &GroupVersion, resource: &APIResource) -> Self {
		Self {
			group: gv.group.clone(),
			version: gv.version.clone(),
			kind: resource.kind.clone(),
			name: resource.name.clone(),
			namespaced: resource.namespaced,
		}
	}

	pub fn gvk(&self) -> GroupVersionKind {
		GroupVersionKind::gvk(&self.group, &self.version, &self.kind)
	}

	pub fn group_kind(&self) -> GroupKind {
		GroupKind {
			group: self.group.clone(),
			kind: self.kind.clone(),
		}
	}

	pub fn api_version(&self) -> String {
		api_version(&self.group, &self.version)
	}

	/// Sub-resources (`pods/status`, `deployments/scale`) address another type's endpoint.
	pub fn is_subresource(&self) -> bool {
		self.name.contains('/')
	}

	/// The kube resource used to set up a dynamic watch for this type.
	pub fn api_resource(&self) -> ApiResource {
		ApiResource::from_gvk_with_plural(&self.gvk(), &self.name)
	}
}

/// Reconcile the cluster's resource types against what kwatch can handle.
///
/// Queries `discovery` once and returns one descriptor per group and kind that
/// passes every filter, in no particular order. When a kind is served at several
/// versions, the one that comes first in the registry's version ordering wins;
/// if neither version is ranked, the first one discovered is kept.
///
/// Discovery failures, malformed groupVersion strings and unknown supported kinds
/// abort the whole reconciliation.
#[instrument(skip_all, fields(kinds = kinds.kinds().len()))]
pub fn reconcile_resource_list<D, R>(
	discovery: &D,
	registry: &R,
	kinds: &SupportedKinds,
) -> Result<Vec<ResourceDescriptor>, ReconcileError>
where
	D: DiscoverySource + ?Sized,
	R: TypeRegistry + ?Sized,
{
	let resource_lists = discovery.server_groups_and_resources()?;
	let matcher = kinds.matcher()?;
	let ordering = registry.prioritized_versions_all_groups();

	let mut reconciled: HashMap<GroupKind, ResourceDescriptor> = HashMap::new();

	for list in &resource_lists {
		let gv = parse_group_version(&list.group_version)?;

		for resource in &list.resources {
			let candidate = ResourceDescriptor::from_api_resource(&gv, resource);
			if candidate.is_subresource() {
				continue;
			}

			let gvk = candidate.gvk();
			if !matcher.matches(&gvk) {
				trace!(api_version = %gvk.api_version(), kind = %gvk.kind, "no rule handles kind");
				continue;
			}
			if !registry.recognizes(&gvk) {
				trace!(api_version = %gvk.api_version(), kind = %gvk.kind, "kind not in scheme");
				continue;
			}

			match reconciled.entry(candidate.group_kind()) {
				Entry::Vacant(entry) => {
					entry.insert(candidate);
				}
				Entry::Occupied(mut entry) => {
					let existing = entry.get_mut();
					if prefers_candidate(&existing.version, &candidate.version, &ordering) {
						trace!(
							group = %existing.group,
							kind = %existing.kind,
							from = %existing.version,
							to = %candidate.version,
							"preferring version"
						);
						existing.version = candidate.version;
					}
				}
			}
		}
	}

	tracing::debug!(
		group_versions = resource_lists.len(),
		resources = reconciled.len(),
		"reconciled resource list"
	);

	Ok(reconciled.into_values().collect())
}

/// Whether `candidate` should replace `existing` as the version of a kind.
///
/// Only the version component of the ordering is compared, the group is ignored.
/// Versions absent from the ordering never displace the existing one.
fn prefers_candidate(existing: &str, candidate: &str, ordering: &[GroupVersion]) -> bool {
	for gv in ordering {
		if gv.version == existing {
			return false;
		}
		if gv.version == candidate {
			return true;
		}
	}
	false
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use assert_matches::assert_matches;
	use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
	use objectkinds::kind_names::{ANY, SERVICE};
	use rstest::rstest;

	use super::*;
	use crate::{k8s::discovery::FailedGroupVersion, scheme::Scheme};

	struct StaticDiscovery(Vec<APIResourceList>);

	impl DiscoverySource for StaticDiscovery {
		fn server_groups_and_resources(&self) -> Result<Vec<APIResourceList>, DiscoveryError> {
			Ok(self.0.clone())
		}
	}

	struct FailingDiscovery;

	impl DiscoverySource for FailingDiscovery {
		fn server_groups_and_resources(&self) -> Result<Vec<APIResourceList>, DiscoveryError> {
			Err(DiscoveryError::GroupDiscoveryFailed(vec![FailedGroupVersion {
				group_version: "apps/v1".to_string(),
				message: "connection refused".to_string(),
			}]))
		}
	}

	fn resource(name: &str, kind: &str) -> APIResource {
		APIResource {
			name: name.to_string(),
			kind: kind.to_string(),
			namespaced: true,
			..Default::default()
		}
	}

	fn list(group_version: &str, resources: Vec<APIResource>) -> APIResourceList {
		APIResourceList {
			group_version: group_version.to_string(),
			resources,
		}
	}

	fn scheme(gvks: &[(&str, &str, &str)], priority: &[(&str, &str)]) -> Scheme {
		let mut scheme = Scheme::new();
		for (group, version, kind) in gvks {
			scheme.add_known_kind(GroupVersionKind::gvk(group, version, kind));
		}
		if !priority.is_empty() {
			let priority: Vec<_> = priority
				.iter()
				.map(|(group, version)| GroupVersion::gv(group, version))
				.collect();
			scheme.set_version_priority(&priority).unwrap();
		}
		scheme
	}

	fn deployments_scheme() -> Scheme {
		scheme(
			&[
				("apps", "v1beta1", "Deployment"),
				("apps", "v1", "Deployment"),
			],
			&[("apps", "v1"), ("apps", "v1beta1")],
		)
	}

	fn find<'a>(out: &'a [ResourceDescriptor], group: &str, kind: &str) -> &'a ResourceDescriptor {
		let matching: Vec<_> = out
			.iter()
			.filter(|r| r.group == group && r.kind == kind)
			.collect();
		assert_eq!(matching.len(), 1, "expected exactly one {group}/{kind}");
		matching[0]
	}

	#[rstest]
	#[case::older_first(["apps/v1beta1", "apps/v1"])]
	#[case::newer_first(["apps/v1", "apps/v1beta1"])]
	fn test_preferred_version_wins_regardless_of_order(#[case] order: [&str; 2]) {
		let discovery = StaticDiscovery(
			order
				.iter()
				.map(|gv| list(gv, vec![resource("deployments", "Deployment")]))
				.collect(),
		);

		let out =
			reconcile_resource_list(&discovery, &deployments_scheme(), &SupportedKinds::all())
				.unwrap();

		assert_eq!(out.len(), 1);
		assert_eq!(find(&out, "apps", "Deployment").version, "v1");
	}

	#[rstest]
	#[case::beta_first(["v1beta2", "v1alpha9"], "v1beta2")]
	#[case::alpha_first(["v1alpha9", "v1beta2"], "v1alpha9")]
	fn test_unranked_versions_keep_first_seen(#[case] order: [&str; 2], #[case] expected: &str) {
		let discovery = StaticDiscovery(
			order
				.iter()
				.map(|gv| list(gv, vec![resource("services", "Service")]))
				.collect(),
		);
		let registry = UnrankedRegistry(scheme(
			&[("", "v1beta2", "Service"), ("", "v1alpha9", "Service")],
			&[],
		));

		let out = reconcile_resource_list(&discovery, &registry, &SupportedKinds::all()).unwrap();
		assert_eq!(find(&out, "", "Service").version, expected);
	}

	/// Registry that recognizes types but ranks no versions at all.
	struct UnrankedRegistry(Scheme);

	impl TypeRegistry for UnrankedRegistry {
		fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
			self.0.recognizes(gvk)
		}

		fn prioritized_versions_all_groups(&self) -> Vec<GroupVersion> {
			Vec::new()
		}
	}

	#[test]
	fn test_ordering_ignores_groups() {
		// Preference is decided by the version string alone, even when the
		// ranked entry belongs to a different group.
		let discovery = StaticDiscovery(vec![
			list("batch/v1beta1", vec![resource("cronjobs", "CronJob")]),
			list("batch/v1", vec![resource("cronjobs", "CronJob")]),
		]);
		let mut registry = scheme(
			&[("batch", "v1beta1", "CronJob"), ("batch", "v1", "CronJob")],
			&[],
		);
		registry
			.set_version_priority(&[GroupVersion::gv("apps", "v1"), GroupVersion::gv("apps", "v1beta1")])
			.unwrap();

		let out =
			reconcile_resource_list(&discovery, &registry, &SupportedKinds::all()).unwrap();
		assert_eq!(find(&out, "batch", "CronJob").version, "v1");
	}

	#[test]
	fn test_only_version_is_updated() {
		let discovery = StaticDiscovery(vec![
			list("apps/v1beta1", vec![resource("deployments", "Deployment")]),
			list(
				"apps/v1",
				vec![APIResource {
					namespaced: false,
					..resource("deploys", "Deployment")
				}],
			),
		]);

		let out =
			reconcile_resource_list(&discovery, &deployments_scheme(), &SupportedKinds::all())
				.unwrap();

		let deployment = find(&out, "apps", "Deployment");
		assert_eq!(deployment.version, "v1");
		assert_eq!(deployment.name, "deployments");
		assert!(deployment.namespaced);
	}

	#[test]
	fn test_subresources_are_excluded() {
		let discovery = StaticDiscovery(vec![list(
			"v1",
			vec![
				resource("pods", "Pod"),
				resource("pods/status", "Pod"),
				resource("pods/log", "Pod"),
				resource("services/proxy", "ServiceProxyOptions"),
			],
		)]);
		let registry = scheme(&[("", "v1", "Pod")], &[]);

		let out = reconcile_resource_list(&discovery, &registry, &SupportedKinds::all()).unwrap();

		assert_eq!(
			out,
			[ResourceDescriptor {
				group: String::new(),
				version: "v1".to_string(),
				kind: "Pod".to_string(),
				name: "pods".to_string(),
				namespaced: true,
			}]
		);
	}

	#[test]
	fn test_status_only_listing_yields_nothing() {
		let discovery = StaticDiscovery(vec![list("v1", vec![resource("pods/status", "Pod")])]);
		let registry = scheme(&[("", "v1", "Pod")], &[]);

		let out = reconcile_resource_list(&discovery, &registry, &SupportedKinds::all()).unwrap();
		assert!(out.is_empty());
	}

	#[test]
	fn test_unsupported_kinds_are_excluded() {
		let discovery = StaticDiscovery(vec![list(
			"v1",
			vec![
				resource("configmaps", "ConfigMap"),
				resource("services", "Service"),
			],
		)]);
		let registry = scheme(&[("", "v1", "ConfigMap"), ("", "v1", "Service")], &[]);

		let out = reconcile_resource_list(&discovery, &registry, &SupportedKinds::all()).unwrap();

		assert_eq!(out.len(), 1);
		assert_eq!(out[0].kind, "Service");
	}

	#[test]
	fn test_sentinel_in_raw_kinds_does_not_widen_matching() {
		let discovery = StaticDiscovery(vec![list(
			"v1",
			vec![
				resource("configmaps", "ConfigMap"),
				resource("services", "Service"),
				resource("secrets", "Secret"),
			],
		)]);
		let registry = scheme(
			&[
				("", "v1", "ConfigMap"),
				("", "v1", "Service"),
				("", "v1", "Secret"),
			],
			&[],
		);
		let kinds = SupportedKinds::from_kinds([ANY, SERVICE]);

		let out = reconcile_resource_list(&discovery, &registry, &kinds).unwrap();

		let kinds: Vec<_> = out.iter().map(|r| r.kind.as_str()).collect();
		assert_eq!(kinds, ["Service"]);
	}

	#[test]
	fn test_unrecognized_versions_are_excluded() {
		let discovery = StaticDiscovery(vec![
			list("apps/v1beta2", vec![resource("deployments", "Deployment")]),
			list("apps/v1", vec![resource("deployments", "Deployment")]),
		]);
		let registry = scheme(&[("apps", "v1", "Deployment")], &[]);

		let out = reconcile_resource_list(&discovery, &registry, &SupportedKinds::all()).unwrap();

		assert_eq!(out.len(), 1);
		assert_eq!(out[0].version, "v1");
	}

	#[test]
	fn test_discovery_failure_propagates() {
		let result =
			reconcile_resource_list(&FailingDiscovery, &Scheme::builtin(), &SupportedKinds::all());

		assert_matches!(
			result,
			Err(ReconcileError::Discovery(DiscoveryError::GroupDiscoveryFailed(failed)))
				if failed[0].group_version == "apps/v1"
		);
	}

	#[test]
	fn test_malformed_group_version_aborts() {
		let discovery = StaticDiscovery(vec![
			list("v1", vec![resource("services", "Service")]),
			list("apps/v1/extra", vec![resource("deployments", "Deployment")]),
		]);

		let result =
			reconcile_resource_list(&discovery, &Scheme::builtin(), &SupportedKinds::all());

		assert_matches!(
			result,
			Err(ReconcileError::GroupVersion(ParseGroupVersionError(gv))) if gv == "apps/v1/extra"
		);
	}

	#[test]
	fn test_unknown_supported_kind_aborts() {
		let discovery = StaticDiscovery(vec![list("v1", vec![resource("services", "Service")])]);
		let kinds = SupportedKinds::from_kinds([SERVICE, "Widget"]);

		let result = reconcile_resource_list(&discovery, &Scheme::builtin(), &kinds);

		assert_matches!(result, Err(ReconcileError::Matcher(UnknownObjectKind(kind))) if kind == "Widget");
	}

	#[test]
	fn test_builtin_scheme_over_typical_cluster() {
		let discovery = StaticDiscovery(vec![
			list(
				"v1",
				vec![
					resource("pods", "Pod"),
					resource("pods/status", "Pod"),
					resource("services", "Service"),
					resource("configmaps", "ConfigMap"),
					resource("serviceaccounts", "ServiceAccount"),
				],
			),
			list(
				"apps/v1",
				vec![
					resource("deployments", "Deployment"),
					resource("deployments/scale", "Scale"),
					resource("statefulsets", "StatefulSet"),
				],
			),
			list(
				"autoscaling/v1",
				vec![resource("horizontalpodautoscalers", "HorizontalPodAutoscaler")],
			),
			list(
				"autoscaling/v2",
				vec![resource("horizontalpodautoscalers", "HorizontalPodAutoscaler")],
			),
			list(
				"example.com/v1",
				vec![resource("widgets", "Widget")],
			),
		]);

		let registry = Scheme::builtin();
		let kinds = SupportedKinds::all();
		let out = reconcile_resource_list(&discovery, &registry, &kinds).unwrap();

		let mut keys: Vec<_> = out.iter().map(ResourceDescriptor::group_kind).collect();
		keys.sort();
		let unique: HashSet<_> = keys.iter().collect();
		assert_eq!(unique.len(), keys.len());

		let matcher = kinds.matcher().unwrap();
		for descriptor in &out {
			assert!(!descriptor.is_subresource());
			assert!(matcher.matches(&descriptor.gvk()));
			assert!(registry.recognizes(&descriptor.gvk()));
		}

		let names: Vec<_> = keys
			.iter()
			.map(|gk| format!("{}/{}", gk.group, gk.kind))
			.collect();
		assert_eq!(
			names,
			[
				"/Pod",
				"/Service",
				"/ServiceAccount",
				"apps/Deployment",
				"apps/StatefulSet",
				"autoscaling/HorizontalPodAutoscaler",
			]
		);
		assert_eq!(
			find(&out, "autoscaling", "HorizontalPodAutoscaler").version,
			"v2"
		);
	}

	#[test]
	fn test_descriptor_api_resource() {
		let descriptor = ResourceDescriptor {
			group: "apps".to_string(),
			version: "v1".to_string(),
			kind: "Deployment".to_string(),
			name: "deployments".to_string(),
			namespaced: true,
		};

		let ar = descriptor.api_resource();
		assert_eq!(ar.api_version, "apps/v1");
		assert_eq!(ar.plural, "deployments");
		assert_eq!(descriptor.api_version(), "apps/v1");
	}

	#[rstest]
	#[case::existing_ranked_first("v1", "v1beta1", false)]
	#[case::candidate_ranked_first("v1beta1", "v1", true)]
	#[case::only_candidate_ranked("v9", "v1", true)]
	#[case::only_existing_ranked("v1", "v9", false)]
	#[case::neither_ranked("v8", "v9", false)]
	fn test_prefers_candidate(#[case] existing: &str, #[case] candidate: &str, #[case] expected: bool) {
		let ordering = [GroupVersion::gv("apps", "v1"), GroupVersion::gv("apps", "v1beta1")];
		assert_eq!(prefers_candidate(existing, candidate, &ordering), expected);
	}
}
