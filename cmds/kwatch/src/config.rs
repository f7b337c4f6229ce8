//! Configuration file support for kwatch
//!
//! Supports `.kwatch.yaml` files that can be placed anywhere in the directory
//! hierarchy. kwatch searches from the working directory upward to the filesystem root.

use std::{
	fs,
	path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use objectkinds::SupportedKinds;
use serde::Deserialize;

use crate::scheme::Scheme;

/// The name of the config file kwatch looks for
pub const CONFIG_FILE_NAME: &str = ".kwatch.yaml";

/// Root configuration structure for .kwatch.yaml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KwatchConfig {
	/// Kubeconfig context to connect with. Defaults to the current context.
	#[serde(default)]
	pub context: Option<String>,

	/// Object kinds the rules are evaluated against. Defaults to every registered kind.
	#[serde(default)]
	pub kinds: Option<Vec<String>>,

	/// Additional types and version preferences for the type registry
	#[serde(default)]
	pub scheme: SchemeConfig,
}

/// Type registry extensions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeConfig {
	/// Custom resource types kwatch should treat as decodable
	#[serde(default)]
	pub extra_kinds: Vec<ExtraKind>,

	/// Version preference per group, most preferred first
	#[serde(default)]
	pub version_priority: Vec<VersionPriority>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraKind {
	pub api_version: String,
	pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPriority {
	pub group: String,
	pub versions: Vec<String>,
}

impl KwatchConfig {
	/// Load config by searching from the given directory upward
	pub fn load_from_directory(start_dir: &Path) -> Result<Option<Self>> {
		if let Some(config_path) = find_config_file(start_dir) {
			let config = Self::load_from_file(&config_path)?;
			Ok(Some(config))
		} else {
			Ok(None)
		}
	}

	/// Load config from a specific file path
	pub fn load_from_file(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("failed to read config file: {}", path.display()))?;
		let config: KwatchConfig = serde_yaml_with_quirks::from_str(&content)
			.with_context(|| format!("failed to parse config file: {}", path.display()))?;
		Ok(config)
	}

	/// Load `path` if given, otherwise search upward from the working directory.
	///
	/// Falls back to the default config when no file is found.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		if let Some(path) = path {
			return Self::load_from_file(path);
		}
		let cwd = std::env::current_dir().context("resolving working directory")?;
		Ok(Self::load_from_directory(&cwd)?.unwrap_or_default())
	}

	/// Supported kinds, with the `Any` sentinel removed.
	pub fn supported_kinds(&self) -> SupportedKinds {
		match &self.kinds {
			Some(kinds) => SupportedKinds::from_kinds(kinds.iter().cloned()),
			None => SupportedKinds::all(),
		}
	}

	/// Built-in scheme extended with the configured types.
	pub fn build_scheme(&self) -> Result<Scheme> {
		let mut scheme = Scheme::builtin();
		scheme
			.extend_from_config(&self.scheme)
			.context("invalid scheme configuration")?;
		Ok(scheme)
	}
}

/// Search for a config file starting from `start_dir` and walking up to the filesystem root
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
	let mut current = start_dir.to_path_buf();

	// Canonicalize if possible to handle relative paths
	if let Ok(canonical) = current.canonicalize() {
		current = canonical;
	}

	loop {
		let config_path = current.join(CONFIG_FILE_NAME);
		if config_path.exists() {
			return Some(config_path);
		}

		match current.parent() {
			Some(parent) if parent != current => current = parent.to_path_buf(),
			_ => break,
		}
	}

	None
}
