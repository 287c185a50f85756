//! Local trash holding area.
//!
//! Destructive operations never delete: superseded local content is moved
//! here so a mistaken run stays recoverable by inspecting the trash.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Pick a destination inside `trash_dir` for `name`, appending `_1`, `_2`,
/// ... before the extension until the name is unused.
pub fn unique_trash_dest(trash_dir: &Path, name: &str) -> PathBuf {
	let candidate = trash_dir.join(name);
	if !candidate.exists() {
		return candidate;
	}

	let (stem, ext) = match name.rsplit_once('.') {
		// A leading dot is a hidden file, not an extension
		Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{}", ext)),
		_ => (name.to_string(), String::new()),
	};

	let mut i = 1;
	loop {
		let candidate = trash_dir.join(format!("{}_{}{}", stem, i, ext));
		if !candidate.exists() {
			return candidate;
		}
		i += 1;
	}
}

/// Move every top-level entry of `dir` into `trash_dir`, creating the trash
/// area if needed. Returns the number of entries displaced.
pub fn displace_contents(dir: &Path, trash_dir: &Path) -> io::Result<usize> {
	fs::create_dir_all(trash_dir)?;
	if !dir.exists() {
		return Ok(0);
	}

	let mut moved = 0;
	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let name = entry.file_name().to_string_lossy().into_owned();
		let dest = unique_trash_dest(trash_dir, &name);
		fs::rename(entry.path(), &dest)?;
		moved += 1;
	}
	Ok(moved)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn first_trash_use_keeps_original_name() {
		let trash = TempDir::new().unwrap();
		let dest = unique_trash_dest(trash.path(), "notes.txt");
		assert_eq!(dest, trash.path().join("notes.txt"));
	}

	#[test]
	fn collision_appends_numeric_suffix_before_extension() {
		let trash = TempDir::new().unwrap();
		fs::write(trash.path().join("notes.txt"), b"old").unwrap();
		let dest = unique_trash_dest(trash.path(), "notes.txt");
		assert_eq!(dest, trash.path().join("notes_1.txt"));

		fs::write(&dest, b"older").unwrap();
		let dest2 = unique_trash_dest(trash.path(), "notes.txt");
		assert_eq!(dest2, trash.path().join("notes_2.txt"));
	}

	#[test]
	fn collision_on_extensionless_name() {
		let trash = TempDir::new().unwrap();
		fs::write(trash.path().join("Makefile"), b"x").unwrap();
		let dest = unique_trash_dest(trash.path(), "Makefile");
		assert_eq!(dest, trash.path().join("Makefile_1"));
	}

	#[test]
	fn displace_moves_everything_and_preserves_prior_trash() {
		let dir = TempDir::new().unwrap();
		let trash = TempDir::new().unwrap();
		fs::write(dir.path().join("a.txt"), b"new a").unwrap();
		fs::create_dir(dir.path().join("sub")).unwrap();

		// Pre-existing trashed copy with the same name
		fs::write(trash.path().join("a.txt"), b"old a").unwrap();

		let moved = displace_contents(dir.path(), trash.path()).unwrap();
		assert_eq!(moved, 2);
		assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
		assert_eq!(fs::read(trash.path().join("a.txt")).unwrap(), b"old a");
		assert_eq!(fs::read(trash.path().join("a_1.txt")).unwrap(), b"new a");
		assert!(trash.path().join("sub").is_dir());
	}

	#[test]
	fn displacing_a_missing_dir_is_a_no_op() {
		let trash = TempDir::new().unwrap();
		let moved = displace_contents(Path::new("/no/such/dir"), trash.path()).unwrap();
		assert_eq!(moved, 0);
	}
}

// vim: ts=4
