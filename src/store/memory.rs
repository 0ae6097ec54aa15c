//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{StoreError, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Thread-safe storage backend that keeps values in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Creates a store pre-populated with `key = value`.
	pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
		let store = Self::default();

		store.0.write().insert(key.into(), value.into());

		store
	}
}
impl TokenStore for MemoryStore {
	fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.0.write().insert(key.to_owned(), value.to_owned());

		Ok(())
	}

	fn remove_item(&self, key: &str) -> Result<(), StoreError> {
		self.0.write().remove(key);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn set_get_remove_round_trip() {
		let store = MemoryStore::default();

		assert_eq!(store.get_item("token").expect("Reads should succeed."), None);

		store.set_item("token", "abc").expect("Writes should succeed.");

		assert_eq!(store.get_item("token").expect("Reads should succeed."), Some("abc".into()));

		store.remove_item("token").expect("Removals should succeed.");

		assert_eq!(store.get_item("token").expect("Reads should succeed."), None);
	}

	#[test]
	fn clones_share_state() {
		let store = MemoryStore::with_item("token", "first");
		let clone = store.clone();

		clone.set_item("token", "second").expect("Writes should succeed.");

		assert_eq!(store.get_item("token").expect("Reads should succeed."), Some("second".into()));
	}
}
