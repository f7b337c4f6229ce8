//! Mock Kubernetes API server for testing.
//!
//! Serves the legacy discovery documents (`/api`, `/apis` and the per-group-version
//! resource lists) over HTTP, so it can be used with kubeconfig-based connections.

pub mod discovery;
pub mod http;

pub use discovery::{MockApiResource, MockDiscovery};
pub use http::{HttpMockK8sServer, RunningHttpMockK8sServer};
