//! Client-level error types shared across interceptors, transports, and services.

// self
use crate::{_prelude::*, rate_limit::RetryHint};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Code reported by transports when a request was aborted by its timeout.
pub const TIMEOUT_CODE: &str = "ECONNABORTED";
/// Code reported when the request never produced a response.
pub const NETWORK_CODE: &str = "ERR_NETWORK";
/// Code reported for 4xx responses.
pub const BAD_REQUEST_CODE: &str = "ERR_BAD_REQUEST";
/// Code reported for 5xx (and other non-success) responses.
pub const BAD_RESPONSE_CODE: &str = "ERR_BAD_RESPONSE";
/// Code reported when a request or response body exceeds its configured cap.
pub const PAYLOAD_TOO_LARGE_CODE: &str = "ERR_PAYLOAD_TOO_LARGE";
/// Code reported when the local limiter vetoes a call before dispatch.
pub const RATE_LIMITED_CODE: &str = "ERR_RATE_LIMITED";

/// Canonical client error exposed by public APIs.
///
/// The pipeline forwards these values untouched; only [`Error::RateLimited`] is ever created by
/// the interceptors themselves.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The local sliding-window limiter vetoed the call before dispatch.
	#[error(transparent)]
	RateLimited(#[from] RateLimitExceeded),
	/// Transport failure (timeout, network, HTTP status, payload caps).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Response body could not be decoded into the requested shape.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the stable error code, when the failure carries one.
	pub fn code(&self) -> Option<&'static str> {
		match self {
			Self::RateLimited(_) => Some(RATE_LIMITED_CODE),
			Self::Transport(e) => Some(e.code()),
			Self::Config(_) | Self::Decode { .. } => None,
		}
	}

	/// Returns a tagged view of the failure for consumers that need to branch on it.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::RateLimited(_) => ErrorKind::RateLimited,
			Self::Transport(TransportError::Timeout { .. }) => ErrorKind::Timeout,
			Self::Transport(TransportError::Network { .. }) => ErrorKind::Network,
			Self::Transport(TransportError::Status { status, message, .. }) =>
				ErrorKind::HttpStatus { status: *status, message: message.clone() },
			_ => ErrorKind::Unknown,
		}
	}

	/// Returns the HTTP status code when the failure came from an upstream response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transport(TransportError::Status { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

/// Tagged classification of an [`Error`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
	/// The transport gave up waiting for a response.
	Timeout,
	/// The local limiter refused the call.
	RateLimited,
	/// Upstream answered with a non-success status.
	HttpStatus {
		/// HTTP status code.
		status: u16,
		/// Server-supplied or canonical message.
		message: String,
	},
	/// No response was received.
	Network,
	/// Anything else (configuration, decoding, payload caps).
	Unknown,
}

/// Local veto raised when the sliding window is full.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Rate limit exceeded: {limit} requests per {window}.")]
pub struct RateLimitExceeded {
	/// Maximum number of accepted attempts inside one window.
	pub limit: usize,
	/// Window length.
	pub window: Duration,
	/// When the window is expected to admit another attempt.
	pub retry: RetryHint,
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A base URL or request target cannot be parsed.
	#[error("URL `{value}` is invalid.")]
	InvalidUrl {
		/// Offending value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A relative request target was issued without a configured origin.
	#[error("Request target `{target}` is relative but no origin is configured.")]
	RelativeTarget {
		/// Offending target.
		target: String,
	},
	/// A header name or value cannot be encoded.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Header name as supplied.
		name: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Body(#[source] serde_json::Error),
	/// Rate limit policy is degenerate.
	#[error("Rate limit policy requires a positive window and request budget.")]
	InvalidRateLimit,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures surfaced by [`crate::http::HttpTransport`] implementations.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request did not complete before the configured timeout.
	#[error("Request timed out after {timeout}.")]
	Timeout {
		/// Configured timeout.
		timeout: Duration,
	},
	/// No response was received (DNS, TCP, TLS).
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Upstream returned a non-success status.
	#[error("Request failed with status {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Message extracted from the body, or the canonical reason.
		message: String,
		/// Raw response body.
		body: Vec<u8>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Request or response body exceeded its configured cap.
	#[error("Payload of at least {size} bytes exceeds the {limit}-byte limit.")]
	PayloadTooLarge {
		/// Observed size (lower bound for streamed responses).
		size: usize,
		/// Configured cap.
		limit: usize,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns the stable code describing this failure.
	pub fn code(&self) -> &'static str {
		match self {
			Self::Timeout { .. } => TIMEOUT_CODE,
			Self::Network { .. } => NETWORK_CODE,
			Self::Status { status, .. } if (400..500).contains(status) => BAD_REQUEST_CODE,
			Self::Status { .. } => BAD_RESPONSE_CODE,
			Self::PayloadTooLarge { .. } => PAYLOAD_TOO_LARGE_CODE,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn status_error(status: u16, message: &str) -> Error {
		TransportError::Status {
			status,
			message: message.into(),
			body: Vec::new(),
			retry_after: None,
		}
		.into()
	}

	#[test]
	fn codes_follow_transport_variants() {
		let timeout: Error = TransportError::Timeout { timeout: Duration::seconds(10) }.into();

		assert_eq!(timeout.code(), Some(TIMEOUT_CODE));
		assert_eq!(status_error(404, "Not Found").code(), Some(BAD_REQUEST_CODE));
		assert_eq!(status_error(503, "Service Unavailable").code(), Some(BAD_RESPONSE_CODE));
		assert_eq!(Error::from(ConfigError::InvalidRateLimit).code(), None);
	}

	#[test]
	fn kind_exposes_status_and_message() {
		let err = status_error(429, "Too many votes");

		assert_eq!(
			err.kind(),
			ErrorKind::HttpStatus { status: 429, message: "Too many votes".into() }
		);
		assert_eq!(err.status(), Some(429));
	}

	#[test]
	fn rate_limit_message_mentions_rate_limit() {
		let now = OffsetDateTime::UNIX_EPOCH;
		let err: Error = RateLimitExceeded {
			limit: 60,
			window: Duration::seconds(60),
			retry: RetryHint { earliest_retry_at: now, wait: Duration::ZERO },
		}
		.into();

		assert!(err.to_string().to_lowercase().contains("rate limit"));
		assert_eq!(err.kind(), ErrorKind::RateLimited);
	}
}
