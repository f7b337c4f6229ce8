//! Mock Kubernetes API discovery types.

/// Pre-configured discovery responses.
///
/// Group-versions are served in the order they are listed here, which is also
/// the order a client sees them in the `/api` and `/apis` documents.
#[derive(Clone)]
pub struct MockDiscovery {
	/// Resource lists keyed by groupVersion (`v1` for the core group).
	pub group_versions: Vec<(String, Vec<MockApiResource>)>,
}

impl Default for MockDiscovery {
	fn default() -> Self {
		Self::empty()
			.with_group_version(
				"v1",
				vec![
					MockApiResource::namespaced("configmaps", "ConfigMap"),
					MockApiResource::namespaced("secrets", "Secret"),
					MockApiResource::namespaced("services", "Service"),
					MockApiResource::namespaced("serviceaccounts", "ServiceAccount"),
					MockApiResource::namespaced("pods", "Pod"),
					MockApiResource::subresource("pods/status", "Pod"),
					MockApiResource::subresource("pods/log", "Pod"),
					MockApiResource::cluster_scoped("namespaces", "Namespace"),
				],
			)
			.with_group_version(
				"apps/v1",
				vec![
					MockApiResource::namespaced("deployments", "Deployment"),
					MockApiResource::subresource("deployments/scale", "Scale"),
					MockApiResource::subresource("deployments/status", "Deployment"),
					MockApiResource::namespaced("statefulsets", "StatefulSet"),
					MockApiResource::namespaced("daemonsets", "DaemonSet"),
				],
			)
			.with_group_version(
				"batch/v1",
				vec![
					MockApiResource::namespaced("jobs", "Job"),
					MockApiResource::namespaced("cronjobs", "CronJob"),
				],
			)
			.with_group_version(
				"autoscaling/v1",
				vec![MockApiResource::namespaced(
					"horizontalpodautoscalers",
					"HorizontalPodAutoscaler",
				)],
			)
			.with_group_version(
				"autoscaling/v2",
				vec![MockApiResource::namespaced(
					"horizontalpodautoscalers",
					"HorizontalPodAutoscaler",
				)],
			)
	}
}

impl MockDiscovery {
	/// Discovery without any group-versions.
	pub fn empty() -> Self {
		Self {
			group_versions: Vec::new(),
		}
	}

	/// Serve an additional group-version.
	pub fn with_group_version(
		mut self,
		group_version: &str,
		resources: Vec<MockApiResource>,
	) -> Self {
		self.group_versions
			.push((group_version.to_string(), resources));
		self
	}

	/// Versions served by the core group, in serving order.
	pub fn core_versions(&self) -> Vec<&str> {
		self.group_versions
			.iter()
			.map(|(gv, _)| gv.as_str())
			.filter(|gv| !gv.contains('/'))
			.collect()
	}

	/// Named API groups with their versions, in serving order.
	pub fn groups(&self) -> Vec<(&str, Vec<&str>)> {
		let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
		for (gv, _) in &self.group_versions {
			let Some((group, version)) = gv.split_once('/') else {
				continue;
			};
			match groups.iter_mut().find(|(name, _)| *name == group) {
				Some((_, versions)) => versions.push(version),
				None => groups.push((group, vec![version])),
			}
		}
		groups
	}
}

/// A mock API resource definition.
#[derive(Clone)]
pub struct MockApiResource {
	pub name: String,
	pub kind: String,
	pub namespaced: bool,
	pub verbs: Vec<String>,
}

impl MockApiResource {
	pub fn namespaced(name: &str, kind: &str) -> Self {
		Self {
			name: name.to_string(),
			kind: kind.to_string(),
			namespaced: true,
			verbs: full_verbs(),
		}
	}

	pub fn cluster_scoped(name: &str, kind: &str) -> Self {
		Self {
			name: name.to_string(),
			kind: kind.to_string(),
			namespaced: false,
			verbs: full_verbs(),
		}
	}

	/// A sub-resource endpoint such as `pods/status`.
	pub fn subresource(name: &str, kind: &str) -> Self {
		Self {
			name: name.to_string(),
			kind: kind.to_string(),
			namespaced: true,
			verbs: vec!["get".into(), "patch".into(), "update".into()],
		}
	}
}

fn full_verbs() -> Vec<String> {
	vec![
		"create".into(),
		"delete".into(),
		"get".into(),
		"list".into(),
		"patch".into(),
		"update".into(),
		"watch".into(),
	]
}
