//! HTTP-based mock Kubernetes server using wiremock.
//!
//! This provides a real HTTP server that can be used with actual kubeconfig-based
//! connections. Only the discovery endpoints and `/version` are served.

use bon::Builder;
use kube::config::{
	AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext,
};
use tracing::{debug, trace};
use wiremock::{
	matchers::{method, path},
	Mock, MockServer, ResponseTemplate,
};

use super::discovery::MockDiscovery;

/// A mock Kubernetes server exposed over HTTP.
#[derive(Builder)]
pub struct HttpMockK8sServer {
	#[builder(default)]
	discovery: MockDiscovery,
	/// Group-versions whose resource list request fails with 503.
	#[builder(default)]
	failing_group_versions: Vec<String>,
	/// Make the `/apis` group listing itself fail with 503.
	#[builder(default)]
	fail_group_list: bool,
}

/// A running HTTP mock server instance.
pub struct RunningHttpMockK8sServer {
	server: MockServer,
}

impl HttpMockK8sServer {
	/// Start the mock server with the configured discovery documents.
	pub async fn start(self) -> RunningHttpMockK8sServer {
		let server = MockServer::start().await;

		debug!(uri = %server.uri(), "Started mock K8s server");

		mount_version(&server).await;
		mount_discovery(
			&server,
			&self.discovery,
			&self.failing_group_versions,
			self.fail_group_list,
		)
		.await;

		RunningHttpMockK8sServer { server }
	}
}

impl RunningHttpMockK8sServer {
	/// Get the server's URI (e.g., "http://127.0.0.1:12345").
	pub fn uri(&self) -> String {
		self.server.uri()
	}

	/// Create a Kubeconfig pointing to this mock server.
	pub fn kubeconfig(&self) -> Kubeconfig {
		self.kubeconfig_with_context("mock-context")
	}

	/// Create a Kubeconfig pointing to this mock server with a custom context name.
	pub fn kubeconfig_with_context(&self, context_name: &str) -> Kubeconfig {
		let cluster_name = "mock-cluster";
		let user_name = "mock-user";

		Kubeconfig {
			clusters: vec![NamedCluster {
				name: cluster_name.to_string(),
				cluster: Some(Cluster {
					server: Some(self.uri()),
					insecure_skip_tls_verify: Some(true),
					..Default::default()
				}),
			}],
			contexts: vec![NamedContext {
				name: context_name.to_string(),
				context: Some(Context {
					cluster: cluster_name.to_string(),
					user: Some(user_name.to_string()),
					namespace: Some("default".to_string()),
					..Default::default()
				}),
			}],
			auth_infos: vec![NamedAuthInfo {
				name: user_name.to_string(),
				auth_info: Some(AuthInfo::default()),
			}],
			current_context: Some(context_name.to_string()),
			..Default::default()
		}
	}
}

async fn mount_version(server: &MockServer) {
	Mock::given(method("GET"))
		.and(path("/version"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"major": "1",
			"minor": "31",
			"gitVersion": "v1.31.0",
			"gitCommit": "fake",
			"gitTreeState": "clean",
			"buildDate": "2024-08-13T00:00:00Z",
			"goVersion": "go1.22.5",
			"compiler": "gc",
			"platform": "linux/amd64"
		})))
		.mount(server)
		.await;
}

fn service_unavailable(message: &str) -> ResponseTemplate {
	ResponseTemplate::new(503).set_body_json(serde_json::json!({
		"kind": "Status",
		"apiVersion": "v1",
		"metadata": {},
		"status": "Failure",
		"message": message,
		"reason": "ServiceUnavailable",
		"code": 503
	}))
}

async fn mount_discovery(
	server: &MockServer,
	discovery: &MockDiscovery,
	failing_group_versions: &[String],
	fail_group_list: bool,
) {
	// Core API versions
	Mock::given(method("GET"))
		.and(path("/api"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"kind": "APIVersions",
			"versions": discovery.core_versions(),
			"serverAddressByClientCIDRs": []
		})))
		.mount(server)
		.await;

	// API groups
	let groups: Vec<_> = discovery
		.groups()
		.into_iter()
		.map(|(group, versions)| {
			let versions: Vec<_> = versions
				.iter()
				.map(|version| {
					serde_json::json!({
						"groupVersion": format!("{group}/{version}"),
						"version": version
					})
				})
				.collect();
			let preferred = versions.first().cloned();
			serde_json::json!({
				"name": group,
				"versions": versions,
				"preferredVersion": preferred
			})
		})
		.collect();

	let groups_response = if fail_group_list {
		service_unavailable("the server is currently unable to handle the request")
	} else {
		ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"kind": "APIGroupList",
			"apiVersion": "v1",
			"groups": groups
		}))
	};

	Mock::given(method("GET"))
		.and(path("/apis"))
		.respond_with(groups_response)
		.mount(server)
		.await;

	// Resource lists (/api/v1, /apis/apps/v1, ...)
	for (gv, rs) in &discovery.group_versions {
		let url_path = if gv.contains('/') {
			format!("/apis/{}", gv)
		} else {
			format!("/api/{}", gv)
		};

		if failing_group_versions.iter().any(|failing| failing == gv) {
			trace!(group_version = %gv, "Mounted failing resource list");
			Mock::given(method("GET"))
				.and(path(url_path))
				.respond_with(service_unavailable(&format!(
					"the server is currently unable to handle the request for {gv}"
				)))
				.mount(server)
				.await;
			continue;
		}

		let resources: Vec<_> = rs
			.iter()
			.map(|r| {
				serde_json::json!({
					"name": r.name,
					"singularName": "",
					"namespaced": r.namespaced,
					"kind": r.kind,
					"verbs": r.verbs,
				})
			})
			.collect();

		trace!(group_version = %gv, count = resources.len(), "Mounted resource list");
		Mock::given(method("GET"))
			.and(path(url_path))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"kind": "APIResourceList",
				"apiVersion": "v1",
				"groupVersion": gv,
				"resources": resources
			})))
			.mount(server)
			.await;
	}
}
