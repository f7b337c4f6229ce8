//! Per-kind predicates.
//!
//! Predicates only look at the group and the kind of a GVK. Versions are
//! resolved elsewhere, an object kind covers every version of its types.

use kube::core::GroupVersionKind;

use crate::kind_names::*;

/// Decides whether a GVK belongs to an object kind.
pub(crate) type KindPredicate = fn(&GroupVersionKind) -> bool;

/// Registered kinds, in registration order.
const ALL_KINDS: &[&str] = &[
	ANY,
	DEPLOYMENT_LIKE,
	JOB_LIKE,
	JOB,
	CRON_JOB,
	SERVICE,
	SERVICE_ACCOUNT,
	SECRET,
	PERSISTENT_VOLUME_CLAIM,
	INGRESS,
	NETWORK_POLICY,
	ROLE,
	CLUSTER_ROLE,
	ROLE_BINDING,
	CLUSTER_ROLE_BINDING,
	HORIZONTAL_POD_AUTOSCALER,
	POD_DISRUPTION_BUDGET,
	SERVICE_MONITOR,
	ROUTE,
	SCALED_OBJECT,
];

static KIND_PREDICATES: phf::Map<&'static str, KindPredicate> = phf::phf_map! {
	"Any" => is_any as KindPredicate,
	"DeploymentLike" => is_deployment_like as KindPredicate,
	"JobLike" => is_job_like as KindPredicate,
	"Job" => is_job as KindPredicate,
	"CronJob" => is_cron_job as KindPredicate,
	"Service" => is_service as KindPredicate,
	"ServiceAccount" => is_service_account as KindPredicate,
	"Secret" => is_secret as KindPredicate,
	"PersistentVolumeClaim" => is_persistent_volume_claim as KindPredicate,
	"Ingress" => is_ingress as KindPredicate,
	"NetworkPolicy" => is_network_policy as KindPredicate,
	"Role" => is_role as KindPredicate,
	"ClusterRole" => is_cluster_role as KindPredicate,
	"RoleBinding" => is_role_binding as KindPredicate,
	"ClusterRoleBinding" => is_cluster_role_binding as KindPredicate,
	"HorizontalPodAutoscaler" => is_horizontal_pod_autoscaler as KindPredicate,
	"PodDisruptionBudget" => is_pod_disruption_budget as KindPredicate,
	"ServiceMonitor" => is_service_monitor as KindPredicate,
	"Route" => is_route as KindPredicate,
	"ScaledObject" => is_scaled_object as KindPredicate,
};

/// Names of every registered object kind, including [`ANY`].
pub fn all_object_kinds() -> Vec<&'static str> {
	ALL_KINDS.to_vec()
}

/// Look up the predicate registered for a kind name.
pub(crate) fn predicate(kind: &str) -> Option<(&'static str, KindPredicate)> {
	KIND_PREDICATES
		.get_entry(kind)
		.map(|(name, predicate)| (*name, *predicate))
}

fn group_kind(gvk: &GroupVersionKind) -> (&str, &str) {
	(gvk.group.as_str(), gvk.kind.as_str())
}

fn is_any(_: &GroupVersionKind) -> bool {
	true
}

fn is_deployment_like(gvk: &GroupVersionKind) -> bool {
	matches!(
		group_kind(gvk),
		("", "Pod" | "ReplicationController")
			| ("apps", "Deployment" | "DaemonSet" | "StatefulSet" | "ReplicaSet")
			| ("extensions", "Deployment" | "DaemonSet" | "ReplicaSet")
			| ("batch", "Job" | "CronJob")
			| ("apps.openshift.io", "DeploymentConfig")
			| ("serving.knative.dev", "Service")
			| ("argoproj.io", "Rollout")
	)
}

fn is_job_like(gvk: &GroupVersionKind) -> bool {
	is_job(gvk) || is_cron_job(gvk)
}

fn is_job(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("batch", "Job")
}

fn is_cron_job(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("batch", "CronJob")
}

fn is_service(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("", "Service")
}

fn is_service_account(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("", "ServiceAccount")
}

fn is_secret(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("", "Secret")
}

fn is_persistent_volume_claim(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("", "PersistentVolumeClaim")
}

fn is_ingress(gvk: &GroupVersionKind) -> bool {
	matches!(
		group_kind(gvk),
		("networking.k8s.io" | "extensions", "Ingress")
	)
}

fn is_network_policy(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("networking.k8s.io", "NetworkPolicy")
}

fn is_role(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("rbac.authorization.k8s.io", "Role")
}

fn is_cluster_role(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("rbac.authorization.k8s.io", "ClusterRole")
}

fn is_role_binding(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("rbac.authorization.k8s.io", "RoleBinding")
}

fn is_cluster_role_binding(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("rbac.authorization.k8s.io", "ClusterRoleBinding")
}

fn is_horizontal_pod_autoscaler(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("autoscaling", "HorizontalPodAutoscaler")
}

fn is_pod_disruption_budget(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("policy", "PodDisruptionBudget")
}

fn is_service_monitor(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("monitoring.coreos.com", "ServiceMonitor")
}

fn is_route(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("route.openshift.io", "Route")
}

fn is_scaled_object(gvk: &GroupVersionKind) -> bool {
	group_kind(gvk) == ("keda.sh", "ScaledObject")
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn test_every_listed_kind_has_a_predicate() {
		for kind in all_object_kinds() {
			assert!(predicate(kind).is_some(), "{kind} has no predicate");
		}
		assert_eq!(ALL_KINDS.len(), KIND_PREDICATES.len());
	}

	#[test]
	fn test_any_is_first() {
		assert_eq!(all_object_kinds().first(), Some(&ANY));
	}

	#[rstest]
	#[case::pod("", "v1", "Pod", true)]
	#[case::deployment("apps", "v1", "Deployment", true)]
	#[case::old_deployment("extensions", "v1beta1", "Deployment", true)]
	#[case::statefulset("apps", "v1beta2", "StatefulSet", true)]
	#[case::cronjob("batch", "v1", "CronJob", true)]
	#[case::deployment_config("apps.openshift.io", "v1", "DeploymentConfig", true)]
	#[case::knative_service("serving.knative.dev", "v1", "Service", true)]
	#[case::core_service("", "v1", "Service", false)]
	#[case::configmap("", "v1", "ConfigMap", false)]
	#[case::wrong_group("example.com", "v1", "Deployment", false)]
	fn test_deployment_like(
		#[case] group: &str,
		#[case] version: &str,
		#[case] kind: &str,
		#[case] expected: bool,
	) {
		let gvk = GroupVersionKind::gvk(group, version, kind);
		assert_eq!(is_deployment_like(&gvk), expected);
	}

	#[rstest]
	#[case::v1("v1")]
	#[case::v2("v2")]
	#[case::v2beta2("v2beta2")]
	fn test_predicates_ignore_version(#[case] version: &str) {
		let gvk = GroupVersionKind::gvk("autoscaling", version, "HorizontalPodAutoscaler");
		assert!(is_horizontal_pod_autoscaler(&gvk));
	}

	#[test]
	fn test_any_matches_unknown_types() {
		let gvk = GroupVersionKind::gvk("example.com", "v1alpha1", "Widget");
		assert!(is_any(&gvk));
	}

	#[test]
	fn test_unknown_kind_has_no_predicate() {
		assert!(predicate("Widget").is_none());
	}
}
