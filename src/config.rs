//! Profiles, the profile store and per-user file locations.
//!
//! A profile names one remote endpoint. The store is a single JSON file
//! that is read and rewritten whole on every mutation; there is no
//! incremental append format, so concurrent writers must serialize on a
//! single control thread.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::SyncError;

fn default_port() -> u16 {
	22
}

fn default_true() -> bool {
	true
}

/// Connection parameters for one remote endpoint.
///
/// `name` is the unique store key and immutable after creation; an upsert
/// with the same name replaces the rest of the record. The profile is
/// read-only while a transfer runs against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
	pub name: String,
	pub host: String,
	pub user: String,
	#[serde(default = "default_port")]
	pub port: u16,
	pub local_path: String,
	pub remote_path: String,
	/// Path to a private key; empty = default agent/identity
	pub identity_file: String,
	/// Create the remote directory automatically before a push
	#[serde(default = "default_true")]
	pub ensure_remote_dir: bool,
}

impl Default for Profile {
	fn default() -> Self {
		Profile {
			name: String::new(),
			host: String::new(),
			user: String::new(),
			port: default_port(),
			local_path: String::new(),
			remote_path: String::new(),
			identity_file: String::new(),
			ensure_remote_dir: true,
		}
	}
}

/// Serialized shape of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
	profiles: Vec<Profile>,
}

/// Profile store backed by one JSON file.
#[derive(Debug)]
pub struct ProfileStore {
	path: PathBuf,
	profiles: Vec<Profile>,
}

impl ProfileStore {
	/// Load the store; a missing file is an empty store, not an error.
	pub fn load(path: &Path) -> Result<Self, SyncError> {
		if !path.exists() {
			return Ok(ProfileStore { path: path.to_path_buf(), profiles: Vec::new() });
		}
		let raw = fs::read_to_string(path)
			.map_err(|e| SyncError::StoreIo { path: path.display().to_string(), source: e })?;
		let file: StoreFile = serde_json::from_str(&raw).map_err(|e| SyncError::StoreCorrupted {
			path: path.display().to_string(),
			message: e.to_string(),
		})?;
		Ok(ProfileStore { path: path.to_path_buf(), profiles: file.profiles })
	}

	/// Rewrite the whole store file.
	pub fn save(&self) -> Result<(), SyncError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).map_err(|e| SyncError::StoreIo {
				path: self.path.display().to_string(),
				source: e,
			})?;
		}
		let file = StoreFile { profiles: self.profiles.clone() };
		let json = serde_json::to_string_pretty(&file)
			.map_err(|e| SyncError::Other { message: format!("Serialize profiles: {}", e) })?;
		fs::write(&self.path, json)
			.map_err(|e| SyncError::StoreIo { path: self.path.display().to_string(), source: e })
	}

	/// Insert or replace a profile, keyed by name.
	pub fn upsert(&mut self, profile: Profile) -> Result<(), SyncError> {
		if profile.name.is_empty() {
			return Err(SyncError::InvalidProfile { message: "name must not be empty".into() });
		}
		match self.profiles.iter_mut().find(|p| p.name == profile.name) {
			Some(existing) => *existing = profile,
			None => self.profiles.push(profile),
		}
		Ok(())
	}

	/// Remove a profile; returns whether anything was removed.
	pub fn delete(&mut self, name: &str) -> bool {
		let before = self.profiles.len();
		self.profiles.retain(|p| p.name != name);
		self.profiles.len() != before
	}

	pub fn get(&self, name: &str) -> Option<&Profile> {
		self.profiles.iter().find(|p| p.name == name)
	}

	pub fn profiles(&self) -> &[Profile] {
		&self.profiles
	}
}

/// Fixed per-user file locations, overridable for tests.
#[derive(Debug, Clone)]
pub struct AppDirs {
	/// Profile store file (~/.parasync/config.json)
	pub config_path: PathBuf,
	/// Local trash holding area (~/.parasync_trash)
	pub trash_dir: PathBuf,
	/// Conventional private key path (~/.ssh/id_ed25519_parasync)
	pub key_path: PathBuf,
}

impl AppDirs {
	/// Resolve the conventional locations under $HOME.
	pub fn resolve() -> Result<Self, SyncError> {
		let home = env::var("HOME")
			.map_err(|_| SyncError::Other { message: "Could not determine HOME directory!".into() })?;
		let home = PathBuf::from(home);
		Ok(AppDirs {
			config_path: home.join(".parasync").join("config.json"),
			trash_dir: home.join(".parasync_trash"),
			key_path: home.join(".ssh").join("id_ed25519_parasync"),
		})
	}

	/// All locations placed under one root. Used by tests.
	pub fn under(root: &Path) -> Self {
		AppDirs {
			config_path: root.join("config.json"),
			trash_dir: root.join("trash"),
			key_path: root.join("id_ed25519_parasync"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn missing_store_is_empty() {
		let dir = TempDir::new().unwrap();
		let store = ProfileStore::load(&dir.path().join("config.json")).unwrap();
		assert!(store.profiles().is_empty());
	}

	#[test]
	fn upsert_save_load_roundtrip() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("config.json");

		let mut store = ProfileStore::load(&path).unwrap();
		store
			.upsert(Profile {
				name: "work".into(),
				host: "10.211.55.2".into(),
				user: "me".into(),
				..Profile::default()
			})
			.unwrap();
		store.save().unwrap();

		let loaded = ProfileStore::load(&path).unwrap();
		let p = loaded.get("work").unwrap();
		assert_eq!(p.host, "10.211.55.2");
		assert_eq!(p.port, 22);
		assert!(p.ensure_remote_dir);
	}

	#[test]
	fn upsert_replaces_by_name() {
		let dir = TempDir::new().unwrap();
		let mut store = ProfileStore::load(&dir.path().join("c.json")).unwrap();
		store.upsert(Profile { name: "a".into(), host: "one".into(), ..Profile::default() }).unwrap();
		store.upsert(Profile { name: "a".into(), host: "two".into(), ..Profile::default() }).unwrap();
		assert_eq!(store.profiles().len(), 1);
		assert_eq!(store.get("a").unwrap().host, "two");
	}

	#[test]
	fn empty_name_is_rejected() {
		let dir = TempDir::new().unwrap();
		let mut store = ProfileStore::load(&dir.path().join("c.json")).unwrap();
		assert!(matches!(
			store.upsert(Profile::default()),
			Err(SyncError::InvalidProfile { .. })
		));
	}

	#[test]
	fn delete_reports_whether_removed() {
		let dir = TempDir::new().unwrap();
		let mut store = ProfileStore::load(&dir.path().join("c.json")).unwrap();
		store.upsert(Profile { name: "a".into(), ..Profile::default() }).unwrap();
		assert!(store.delete("a"));
		assert!(!store.delete("a"));
	}

	#[test]
	fn mutation_is_full_read_modify_write() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("config.json");

		let mut store = ProfileStore::load(&path).unwrap();
		store.upsert(Profile { name: "first".into(), ..Profile::default() }).unwrap();
		store.save().unwrap();

		// A separate load-modify-save must keep "first" intact
		let mut second = ProfileStore::load(&path).unwrap();
		second.upsert(Profile { name: "second".into(), ..Profile::default() }).unwrap();
		second.save().unwrap();

		let merged = ProfileStore::load(&path).unwrap();
		assert!(merged.get("first").is_some());
		assert!(merged.get("second").is_some());
	}

	#[test]
	fn corrupted_store_is_a_distinct_error() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("config.json");
		fs::write(&path, "{ invalid json").unwrap();
		assert!(matches!(
			ProfileStore::load(&path),
			Err(SyncError::StoreCorrupted { .. })
		));
	}
}

// vim: ts=4
