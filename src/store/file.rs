//! Simple file-backed [`TokenStore`] that keeps a JSON object of string values on disk.
//!
//! The file is re-read on every lookup so tokens written by another process (for example a
//! login helper) are picked up without restarting the client.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{StoreError, TokenStore},
};

/// Persists values to a JSON object after each mutation.
#[derive(Debug)]
pub struct FileStore {
	path: PathBuf,
	// Serializes writers within this process.
	write_guard: Mutex<()>,
}
impl FileStore {
	/// Opens a store at the provided path, creating parent directories as needed.
	///
	/// The file itself is created lazily on the first write.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		Ok(Self { path, write_guard: Mutex::new(()) })
	}

	/// Returns the path backing this store.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
		if !path.exists() {
			return Ok(BTreeMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(BTreeMap::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, contents: &BTreeMap<String, String>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
		let _guard = self.write_guard.lock();
		let mut snapshot = Self::load_snapshot(&self.path)?;

		f(&mut snapshot);

		self.persist(&snapshot)
	}
}
impl TokenStore for FileStore {
	fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(Self::load_snapshot(&self.path)?.remove(key))
	}

	fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.mutate(|snapshot| {
			snapshot.insert(key.to_owned(), value.to_owned());
		})
	}

	fn remove_item(&self, key: &str) -> Result<(), StoreError> {
		self.mutate(|snapshot| {
			snapshot.remove(key);
		})
	}
}
