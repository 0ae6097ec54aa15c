//! Key-value storage contracts and built-in stores for the bearer token.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Key-value backend the token accessor reads from.
///
/// Implementations report every failure through [`StoreError`]; the accessor decides how those
/// failures degrade, so stores never need to swallow errors themselves.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the value stored under `key`, if any.
	fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Removes the value stored under `key`.
	fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}
impl<S> TokenStore for Arc<S>
where
	S: ?Sized + TokenStore,
{
	fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
		(**self).get_item(key)
	}

	fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
		(**self).set_item(key, value)
	}

	fn remove_item(&self, key: &str) -> Result<(), StoreError> {
		(**self).remove_item(key)
	}
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// The backing store cannot be reached at all.
	#[error("Store is unavailable: {message}.")]
	Unavailable {
		/// Human-readable error payload.
		message: String,
	},
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn arc_store_delegates_to_inner() {
		let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());

		store.set_item("token", "abc").expect("Memory store should accept writes.");

		assert_eq!(
			store.get_item("token").expect("Memory store reads should succeed."),
			Some("abc".into())
		);
	}

	#[test]
	fn store_error_messages_carry_payload() {
		let err = StoreError::Unavailable { message: "storage disabled".into() };

		assert_eq!(err.to_string(), "Store is unavailable: storage disabled.");
	}
}
