//! Name-set diffing between two directory snapshots.
//!
//! A snapshot is just the set of top-level entry names one side reported;
//! the two sides are never captured atomically with respect to each other,
//! so a diff is a best-effort view, recomputed on demand and never stored.

use std::collections::BTreeSet;

/// Three disjoint partitions of `source ∪ dest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirDiff {
	/// In source, not in destination
	pub to_add: BTreeSet<String>,
	/// In destination, not in source
	pub to_delete: BTreeSet<String>,
	/// Present on both sides
	pub to_overwrite: BTreeSet<String>,
}

impl DirDiff {
	pub fn is_empty(&self) -> bool {
		self.to_add.is_empty() && self.to_delete.is_empty() && self.to_overwrite.is_empty()
	}
}

/// Pure set diff: `(source − dest, dest − source, source ∩ dest)`.
pub fn diff(source: &BTreeSet<String>, dest: &BTreeSet<String>) -> DirDiff {
	DirDiff {
		to_add: source.difference(dest).cloned().collect(),
		to_delete: dest.difference(source).cloned().collect(),
		to_overwrite: source.intersection(dest).cloned().collect(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn set(names: &[&str]) -> BTreeSet<String> {
		names.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn partitions_are_disjoint_and_cover_union() {
		let s = set(&["a", "b", "c", "d"]);
		let d = set(&["c", "d", "e"]);
		let r = diff(&s, &d);

		assert_eq!(r.to_add, set(&["a", "b"]));
		assert_eq!(r.to_delete, set(&["e"]));
		assert_eq!(r.to_overwrite, set(&["c", "d"]));

		// Disjoint
		assert!(r.to_add.is_disjoint(&r.to_delete));
		assert!(r.to_add.is_disjoint(&r.to_overwrite));
		assert!(r.to_delete.is_disjoint(&r.to_overwrite));

		// Union covers S ∪ D
		let union: BTreeSet<String> = s.union(&d).cloned().collect();
		let parts: BTreeSet<String> = r
			.to_add
			.iter()
			.chain(r.to_delete.iter())
			.chain(r.to_overwrite.iter())
			.cloned()
			.collect();
		assert_eq!(parts, union);
	}

	#[test]
	fn diff_is_deterministic() {
		let s = set(&["x", "y"]);
		let d = set(&["y", "z"]);
		assert_eq!(diff(&s, &d), diff(&s, &d));
	}

	#[test]
	fn identical_sets_are_all_overlap() {
		let s = set(&["a", "b"]);
		let r = diff(&s, &s);
		assert!(r.to_add.is_empty());
		assert!(r.to_delete.is_empty());
		assert_eq!(r.to_overwrite, s);
	}

	#[test]
	fn empty_destination_is_all_additions() {
		let s = set(&["a", "b"]);
		let r = diff(&s, &BTreeSet::new());
		assert_eq!(r.to_add, s);
		assert!(r.to_delete.is_empty());
		assert!(r.to_overwrite.is_empty());
	}

	#[test]
	fn empty_source_is_all_deletions() {
		let d = set(&["a", "b"]);
		let r = diff(&BTreeSet::new(), &d);
		assert!(r.to_add.is_empty());
		assert_eq!(r.to_delete, d);
		assert!(r.to_overwrite.is_empty());
	}

	#[test]
	fn two_empty_sets_diff_to_empty() {
		let r = diff(&BTreeSet::new(), &BTreeSet::new());
		assert!(r.is_empty());
	}
}

// vim: ts=4
