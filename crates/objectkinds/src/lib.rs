//! Object kinds understood by the kwatch rule engine.
//!
//! Every rule declares the object kinds it applies to by name (`DeploymentLike`,
//! `Service`, ...). Each name maps to a predicate over a [`GroupVersionKind`], which
//! decides whether an object of that type is something the rule can look at.

mod kinds;
mod matcher;

pub use kind_names::*;
pub use kinds::all_object_kinds;
pub use kube::core::GroupVersionKind;
pub use matcher::{construct_matcher, Matcher, SupportedKinds, UnknownObjectKind};

/// Names of the registered object kinds.
pub mod kind_names {
	/// Catch-all kind, matches every object.
	pub const ANY: &str = "Any";
	pub const DEPLOYMENT_LIKE: &str = "DeploymentLike";
	pub const JOB_LIKE: &str = "JobLike";
	pub const JOB: &str = "Job";
	pub const CRON_JOB: &str = "CronJob";
	pub const SERVICE: &str = "Service";
	pub const SERVICE_ACCOUNT: &str = "ServiceAccount";
	pub const SECRET: &str = "Secret";
	pub const PERSISTENT_VOLUME_CLAIM: &str = "PersistentVolumeClaim";
	pub const INGRESS: &str = "Ingress";
	pub const NETWORK_POLICY: &str = "NetworkPolicy";
	pub const ROLE: &str = "Role";
	pub const CLUSTER_ROLE: &str = "ClusterRole";
	pub const ROLE_BINDING: &str = "RoleBinding";
	pub const CLUSTER_ROLE_BINDING: &str = "ClusterRoleBinding";
	pub const HORIZONTAL_POD_AUTOSCALER: &str = "HorizontalPodAutoscaler";
	pub const POD_DISRUPTION_BUDGET: &str = "PodDisruptionBudget";
	pub const SERVICE_MONITOR: &str = "ServiceMonitor";
	pub const ROUTE: &str = "Route";
	pub const SCALED_OBJECT: &str = "ScaledObject";
}
