//! Kubernetes cluster access for discovery.
//!
//! This module provides native Kubernetes API access using kube-rs,
//! plus the group-version helpers shared by discovery and configuration.

pub mod client;
pub mod discovery;

use kube::core::GroupVersion;
use thiserror::Error;

/// A groupVersion string that is neither `version` nor `group/version`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected GroupVersion string: {0}")]
pub struct ParseGroupVersionError(pub String);

/// Parse a groupVersion string as served by the discovery API.
///
/// - `""` and `"/"` parse to the empty group-version
/// - `"v1"` is the core group at version `v1`
/// - `"apps/v1"` is group `apps` at version `v1`
///
/// Anything with more than one `/` is rejected.
pub fn parse_group_version(gv: &str) -> Result<GroupVersion, ParseGroupVersionError> {
	if gv.is_empty() || gv == "/" {
		return Ok(GroupVersion::gv("", ""));
	}
	match gv.matches('/').count() {
		0 => Ok(GroupVersion::gv("", gv)),
		1 => {
			let (group, version) = gv
				.split_once('/')
				.ok_or_else(|| ParseGroupVersionError(gv.to_string()))?;
			Ok(GroupVersion::gv(group, version))
		}
		_ => Err(ParseGroupVersionError(gv.to_string())),
	}
}

/// Format a group and version as an apiVersion string.
pub fn api_version(group: &str, version: &str) -> String {
	if group.is_empty() {
		version.to_string()
	} else {
		format!("{group}/{version}")
	}
}
