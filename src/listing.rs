//! Directory listers for the two observation channels.
//!
//! The local side is a real filesystem read; the remote side is one `ls -1`
//! issued through the transport. Both treat a missing directory as an empty
//! set so the diff engine can handle the two sides uniformly.

use std::collections::BTreeSet;
use std::path::Path;

use crate::command;
use crate::config::Profile;
use crate::error::SyncError;
use crate::transport::{Invocation, Transport};

/// Timeout for the single remote listing round trip.
const LIST_TIMEOUT_SECS: u64 = 15;

/// Top-level entry names of a local directory.
///
/// A non-existent path yields an empty set, mirroring the remote
/// convention. Entries with non-UTF8 names are listed lossily.
pub fn local_entries(path: &Path) -> BTreeSet<String> {
	let mut names = BTreeSet::new();
	let entries = match std::fs::read_dir(path) {
		Ok(entries) => entries,
		Err(_) => return names,
	};
	for entry in entries.flatten() {
		names.insert(entry.file_name().to_string_lossy().into_owned());
	}
	names
}

/// Top-level entry names of a remote directory, via one ssh round trip.
///
/// The remote command suppresses the "no such directory" error and falls
/// back to empty output, so absence and emptiness are indistinguishable by
/// design. Auth/network failures and timeouts still surface as errors.
pub async fn remote_entries(
	transport: &dyn Transport,
	profile: &Profile,
	remote_path: &str,
) -> Result<BTreeSet<String>, SyncError> {
	let mut args = command::ssh_args(profile, true);
	args.push(command::remote_target(profile));
	args.push(command::list_dir_cmd(remote_path));

	let inv = Invocation::new("ssh", args).with_timeout(LIST_TIMEOUT_SECS);
	let out = transport.run(&inv).await?;
	if !out.ok() {
		return Err(SyncError::Other {
			message: format!("Remote listing failed: {}", out.error_text()),
		});
	}
	Ok(parse_listing(&out.stdout))
}

/// Parse newline-separated `ls -1` output into a name set.
///
/// Names are taken verbatim: surrounding whitespace is part of the name.
/// `lines` already drops the `\r` of CRLF endings, so only empty lines
/// (the `|| echo ''` fallback) are filtered out.
pub fn parse_listing(stdout: &str) -> BTreeSet<String> {
	stdout.lines().filter(|l| !l.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[test]
	fn missing_local_dir_is_empty_set() {
		assert!(local_entries(Path::new("/no/such/parasync/dir")).is_empty());
	}

	#[test]
	fn local_entries_lists_files_and_dirs_non_recursively() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("a.txt"), b"a").unwrap();
		fs::create_dir(dir.path().join("sub")).unwrap();
		fs::write(dir.path().join("sub").join("nested.txt"), b"n").unwrap();

		let names = local_entries(dir.path());
		assert_eq!(names.len(), 2);
		assert!(names.contains("a.txt"));
		assert!(names.contains("sub"));
		assert!(!names.contains("nested.txt"));
	}

	#[test]
	fn parse_listing_skips_blank_lines() {
		let names = parse_listing("a.txt\n\nb.txt\n");
		assert_eq!(names.len(), 2);
		assert!(names.contains("a.txt"));
		assert!(names.contains("b.txt"));
	}

	#[test]
	fn parse_listing_keeps_whitespace_in_names() {
		let names = parse_listing(" padded.txt\ntrailing.txt \n");
		assert!(names.contains(" padded.txt"));
		assert!(names.contains("trailing.txt "));
	}

	#[test]
	fn parse_empty_fallback_output() {
		// `|| echo ''` emits a single newline for a missing directory
		assert!(parse_listing("\n").is_empty());
		assert!(parse_listing("").is_empty());
	}
}

// vim: ts=4
