//! Client configuration: API base URL resolution, transport caps, and limiter policy.

// self
use crate::{
	_prelude::*, auth::DEFAULT_TOKEN_KEY, error::ConfigError, rate_limit::RateLimitPolicy,
};

/// Environment variable overriding the API base URL.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";
/// Environment variable supplying the origin relative base URLs are resolved against.
pub const API_ORIGIN_ENV: &str = "API_ORIGIN";
/// Base path used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "/api";

/// Transport and pipeline settings shared by every call a [`crate::client::Client`] makes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// API base URL or base path, already trimmed and stripped of trailing slashes.
	pub base_url: String,
	/// Origin that relative base URLs and request targets are joined onto.
	pub origin: Option<Url>,
	/// Whole-request timeout enforced by the transport.
	#[serde(with = "duration_millis")]
	pub timeout: Duration,
	/// Maximum accepted response body size in bytes.
	pub max_content_length: usize,
	/// Maximum request body size in bytes.
	pub max_body_length: usize,
	/// Store key the bearer token is read from.
	pub token_key: String,
	/// Local sliding-window limiter policy.
	pub rate_limit: RateLimitPolicy,
}
impl ClientConfig {
	/// Default request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(10);
	/// Default cap for request and response bodies.
	pub const DEFAULT_MAX_LENGTH: usize = 10_000_000;

	/// Builds a configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds a configuration from an arbitrary variable lookup.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let base_url = resolve_base_url(lookup(API_BASE_URL_ENV).as_deref());
		let origin = match lookup(API_ORIGIN_ENV).map(|v| v.trim().to_owned()) {
			Some(raw) if !raw.is_empty() => Some(parse_url(&raw)?),
			_ => None,
		};

		Ok(Self { base_url, origin, ..Default::default() })
	}

	/// Overrides the base URL, applying the same normalization as the environment override.
	pub fn with_base_url(mut self, raw: &str) -> Self {
		self.base_url = resolve_base_url(Some(raw));

		self
	}

	/// Sets the origin relative targets are resolved against.
	pub fn with_origin(mut self, origin: Url) -> Self {
		self.origin = Some(origin);

		self
	}

	/// Overrides the transport timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the limiter policy.
	pub fn with_rate_limit(mut self, policy: RateLimitPolicy) -> Self {
		self.rate_limit = policy;

		self
	}

	/// Overrides the store key holding the bearer token.
	pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
		self.token_key = key.into();

		self
	}

	/// Joins `path` onto the base URL with exactly one separating slash.
	pub fn endpoint(&self, path: &str) -> String {
		join_path(&self.base_url, path)
	}

	/// Resolves `target` to an absolute URL, using [`ClientConfig::origin`] for relative targets.
	pub fn resolve(&self, target: &str) -> Result<Url, ConfigError> {
		if let Ok(url) = Url::parse(target) {
			return Ok(url);
		}

		let Some(origin) = self.origin.as_ref() else {
			return Err(ConfigError::RelativeTarget { target: target.into() });
		};

		origin
			.join(target)
			.map_err(|source| ConfigError::InvalidUrl { value: target.into(), source })
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.into(),
			origin: None,
			timeout: Self::DEFAULT_TIMEOUT,
			max_content_length: Self::DEFAULT_MAX_LENGTH,
			max_body_length: Self::DEFAULT_MAX_LENGTH,
			token_key: DEFAULT_TOKEN_KEY.into(),
			rate_limit: RateLimitPolicy::default(),
		}
	}
}

/// Normalizes an API base URL override.
///
/// The value is trimmed; a missing or blank override yields [`DEFAULT_BASE_URL`], anything else
/// has every trailing `/` removed.
pub fn resolve_base_url(raw: Option<&str>) -> String {
	match raw.map(str::trim) {
		Some(value) if !value.is_empty() => value.trim_end_matches('/').to_owned(),
		_ => DEFAULT_BASE_URL.into(),
	}
}

fn join_path(base: &str, path: &str) -> String {
	format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { value: raw.into(), source })
}

pub(crate) mod duration_millis {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};
	use time::Duration;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_milliseconds() as i64)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::milliseconds)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn base_url_strips_trailing_slashes() {
		assert_eq!(resolve_base_url(Some("https://api.example.com/")), "https://api.example.com");
		assert_eq!(
			resolve_base_url(Some("  https://api.example.com///  ")),
			"https://api.example.com"
		);
	}

	#[test]
	fn blank_or_missing_override_uses_default() {
		assert_eq!(resolve_base_url(None), "/api");
		assert_eq!(resolve_base_url(Some("   ")), "/api");
	}

	#[test]
	fn from_lookup_reads_overrides() {
		let config = ClientConfig::from_lookup(|name| match name {
			API_BASE_URL_ENV => Some("https://api.example.com/".into()),
			API_ORIGIN_ENV => Some(" https://app.example.com ".into()),
			_ => None,
		})
		.expect("Lookup-backed configuration should build.");

		assert_eq!(config.base_url, "https://api.example.com");
		assert_eq!(config.origin.as_ref().map(Url::as_str), Some("https://app.example.com/"));
		assert_eq!(config.endpoint("/users/votes"), "https://api.example.com/users/votes");
		assert_eq!(config.timeout, Duration::seconds(10));
		assert_eq!(config.max_content_length, 10_000_000);
		assert_eq!(config.max_body_length, 10_000_000);
	}

	#[test]
	fn invalid_origin_is_rejected() {
		let err =
			ClientConfig::from_lookup(|name| (name == API_ORIGIN_ENV).then(|| "not a url".into()))
				.expect_err("Invalid origin should be rejected.");

		assert!(matches!(err, ConfigError::InvalidUrl { .. }));
	}

	#[test]
	fn resolve_joins_relative_targets_onto_origin() {
		let origin = Url::parse("https://app.example.com").expect("Origin fixture should parse.");
		let config = ClientConfig::default().with_origin(origin);
		let url = config
			.resolve(&config.endpoint("users/votes"))
			.expect("Relative target should resolve.");

		assert_eq!(url.as_str(), "https://app.example.com/api/users/votes");
	}

	#[test]
	fn resolve_without_origin_rejects_relative_targets() {
		let err = ClientConfig::default()
			.resolve("/api/users/votes")
			.expect_err("Relative target without origin should fail.");

		assert!(matches!(err, ConfigError::RelativeTarget { .. }));
	}

	#[test]
	fn degenerate_rate_limits_fail_to_load() {
		for payload in [
			"{\"rate_limit\":{\"max_requests\":0}}",
			"{\"rate_limit\":{\"window\":0}}",
			"{\"rate_limit\":{\"window\":-60000}}",
		] {
			serde_json::from_str::<ClientConfig>(payload)
				.expect_err("Degenerate rate limits should be rejected while loading.");
		}
	}

	#[test]
	fn huge_rate_limit_budget_loads() {
		let config: ClientConfig =
			serde_json::from_str("{\"rate_limit\":{\"max_requests\":18446744073709551615}}")
				.expect("A huge budget is still a valid policy.");

		assert_eq!(config.rate_limit.max_requests(), usize::MAX);
		assert_eq!(config.rate_limit.window(), Duration::seconds(60));
	}

	#[test]
	fn config_deserializes_with_defaults() {
		let config: ClientConfig =
			serde_json::from_str("{\"base_url\":\"https://api.example.com\",\"timeout\":2500}")
				.expect("Partial configuration should deserialize.");

		assert_eq!(config.timeout, Duration::milliseconds(2_500));
		assert_eq!(config.rate_limit, RateLimitPolicy::default());
		assert_eq!(config.token_key, "token");
	}
}
