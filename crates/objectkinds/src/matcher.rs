use std::fmt;

use kube::core::GroupVersionKind;
use thiserror::Error;

use crate::{
	kind_names::ANY,
	kinds::{all_object_kinds, predicate, KindPredicate},
};

/// A kind name that has no registered predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown object kind: {0:?}")]
pub struct UnknownObjectKind(pub String);

/// Matches a GVK against a set of object kinds.
///
/// A GVK matches if any of the kinds the matcher was built from matches it.
#[derive(Clone)]
pub struct Matcher {
	kinds: Vec<&'static str>,
	predicates: Vec<KindPredicate>,
}

impl fmt::Debug for Matcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Matcher")
			.field("kinds", &self.kinds)
			.finish_non_exhaustive()
	}
}

impl Matcher {
	pub fn matches(&self, gvk: &GroupVersionKind) -> bool {
		self.predicates.iter().any(|predicate| predicate(gvk))
	}

	/// Kind names this matcher was built from.
	pub fn kinds(&self) -> &[&'static str] {
		&self.kinds
	}
}

/// Build a matcher from kind names.
///
/// Fails on the first name that is not a registered object kind.
pub fn construct_matcher<S: AsRef<str>>(kinds: &[S]) -> Result<Matcher, UnknownObjectKind> {
	let mut matcher = Matcher {
		kinds: Vec::with_capacity(kinds.len()),
		predicates: Vec::with_capacity(kinds.len()),
	};
	for kind in kinds {
		let kind = kind.as_ref();
		let (name, predicate) = predicate(kind).ok_or_else(|| UnknownObjectKind(kind.to_owned()))?;
		matcher.kinds.push(name);
		matcher.predicates.push(predicate);
	}
	Ok(matcher)
}

/// Kinds the rule engine can evaluate, with the [`ANY`] sentinel removed.
///
/// `Any` is a wildcard for rules that apply to every object. Matching discovered
/// types against it would accept every type the cluster serves, so it is dropped
/// when the set is built and never reaches a [`Matcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedKinds {
	kinds: Vec<String>,
}

impl SupportedKinds {
	/// Every registered object kind except [`ANY`].
	pub fn all() -> Self {
		Self::from_kinds(all_object_kinds())
	}

	/// Build the set from a raw kind list. Duplicates are dropped, first occurrence wins.
	pub fn from_kinds<I, S>(kinds: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut out: Vec<String> = Vec::new();
		for kind in kinds {
			let kind = kind.into();
			if kind == ANY || out.contains(&kind) {
				continue;
			}
			out.push(kind);
		}
		Self { kinds: out }
	}

	pub fn kinds(&self) -> &[String] {
		&self.kinds
	}

	pub fn matcher(&self) -> Result<Matcher, UnknownObjectKind> {
		construct_matcher(&self.kinds)
	}
}

impl Default for SupportedKinds {
	fn default() -> Self {
		Self::all()
	}
}
