//! Store-backed token lookup that never fails.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	obs::{Diagnostic, DiagnosticSink, TracingSink},
	store::TokenStore,
};

/// Key the login flow stores the bearer token under.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Reads the bearer token from a [`TokenStore`].
///
/// Every failure mode (unavailable store, missing key, failed read) degrades to `None`, so
/// callers never distinguish "absent" from "inaccessible". Store failures are reported to the
/// configured [`DiagnosticSink`] and otherwise swallowed.
#[derive(Clone)]
pub struct TokenAccessor {
	store: Option<Arc<dyn TokenStore>>,
	key: String,
	sink: Arc<dyn DiagnosticSink>,
}
impl TokenAccessor {
	/// Creates an accessor reading [`DEFAULT_TOKEN_KEY`] from `store`.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self { store: Some(store), key: DEFAULT_TOKEN_KEY.into(), sink: Arc::new(TracingSink) }
	}

	/// Creates an accessor with no backing store; it always yields `None`.
	pub fn unavailable() -> Self {
		Self { store: None, key: DEFAULT_TOKEN_KEY.into(), sink: Arc::new(TracingSink) }
	}

	/// Overrides the key the token is read from.
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = key.into();

		self
	}

	/// Overrides where storage fallbacks are reported.
	pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
		self.sink = sink;

		self
	}

	/// Returns the key this accessor reads.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Returns the stored token, or `None` when it is missing, empty, or unreadable.
	pub fn token(&self) -> Option<TokenSecret> {
		let store = self.store.as_ref()?;

		match store.get_item(&self.key) {
			Ok(Some(value)) if !value.is_empty() => Some(TokenSecret::new(value)),
			Ok(_) => None,
			Err(e) => {
				self.sink.emit(Diagnostic::StorageFallback, &e.to_string());

				None
			},
		}
	}

	/// Returns the `Authorization` header value for the stored token, if any.
	pub fn bearer(&self) -> Option<String> {
		self.token().map(|token| token.bearer())
	}
}
impl Debug for TokenAccessor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenAccessor")
			.field("key", &self.key)
			.field("store_available", &self.store.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		obs::RecordingSink,
		store::{MemoryStore, StoreError},
	};

	struct BrokenStore;
	impl TokenStore for BrokenStore {
		fn get_item(&self, _: &str) -> Result<Option<String>, StoreError> {
			Err(StoreError::Unavailable { message: "storage disabled".into() })
		}

		fn set_item(&self, _: &str, _: &str) -> Result<(), StoreError> {
			Err(StoreError::Unavailable { message: "storage disabled".into() })
		}

		fn remove_item(&self, _: &str) -> Result<(), StoreError> {
			Err(StoreError::Unavailable { message: "storage disabled".into() })
		}
	}

	#[test]
	fn returns_stored_token() {
		let accessor = TokenAccessor::new(Arc::new(MemoryStore::with_item("token", "abc")));

		assert_eq!(accessor.token().map(|t| t.expose().to_owned()), Some("abc".into()));
		assert_eq!(accessor.bearer(), Some("Bearer abc".into()));
	}

	#[test]
	fn missing_and_empty_tokens_are_absent() {
		let store = MemoryStore::default();
		let accessor = TokenAccessor::new(Arc::new(store.clone()));

		assert!(accessor.token().is_none());

		store.set_item("token", "").expect("Memory store should accept writes.");

		assert!(accessor.token().is_none());
	}

	#[test]
	fn store_failures_degrade_to_none_and_are_reported() {
		let sink = RecordingSink::default();
		let accessor = TokenAccessor::new(Arc::new(BrokenStore)).with_sink(Arc::new(sink.clone()));

		assert!(accessor.token().is_none());
		assert_eq!(sink.kinds(), vec![Diagnostic::StorageFallback]);
	}

	#[test]
	fn unavailable_store_yields_none() {
		assert!(TokenAccessor::unavailable().token().is_none());
	}

	#[test]
	fn custom_key_is_honored() {
		let store = MemoryStore::with_item("session", "xyz");
		let accessor = TokenAccessor::new(Arc::new(store)).with_key("session");

		assert_eq!(accessor.key(), "session");
		assert_eq!(accessor.bearer(), Some("Bearer xyz".into()));
	}
}
