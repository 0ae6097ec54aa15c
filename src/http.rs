//! Transport primitives for the request pipeline.
//!
//! The module exposes [`RequestContext`] (the mutable per-call request that interceptors see),
//! [`HttpResponse`], and the [`HttpTransport`] trait that is the client's only dependency on an
//! HTTP stack. [`ReqwestTransport`] is the default implementation; it enforces the configured
//! timeout and body caps and turns non-success statuses into [`TransportError::Status`].

pub use ::http::{HeaderMap, HeaderValue, Method, StatusCode, header};

// crates.io
use ::http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, RETRY_AFTER};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};
#[cfg(feature = "reqwest")] use crate::config::ClientConfig;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of dispatching a [`RequestContext`].
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back every clone
/// of a client. Failures are reported as [`Error::Transport`] (or [`Error::Config`] when the
/// request cannot be built); the pipeline forwards them to callers untouched.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `request` and resolves with the complete response.
	fn execute(&self, request: RequestContext) -> TransportFuture<'_>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	fn execute(&self, request: RequestContext) -> TransportFuture<'_> {
		(**self).execute(request)
	}
}

/// Per-call request configuration handed through the request interceptors.
#[derive(Clone, Debug)]
pub struct RequestContext {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL or path relative to the configured origin.
	pub target: String,
	/// Outgoing headers.
	pub headers: HeaderMap,
	/// Serialized request body, if any.
	pub body: Option<Vec<u8>>,
}
impl RequestContext {
	/// Creates a request without headers or body.
	pub fn new(method: Method, target: impl Into<String>) -> Self {
		Self { method, target: target.into(), headers: HeaderMap::new(), body: None }
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
		self.set_header(name, value)?;

		Ok(self)
	}

	/// Merges `headers` into the request, replacing existing values with the same name.
	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		for (name, value) in headers.iter() {
			self.headers.insert(name.clone(), value.clone());
		}

		self
	}

	/// Serializes `body` as JSON and sets the matching content type.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body).map_err(ConfigError::Body)?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(bytes);

		Ok(self)
	}

	/// Adds or replaces a header in place.
	pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
		let invalid = || ConfigError::InvalidHeader { name: name.into() };
		let name = HeaderName::try_from(name).map_err(|_| invalid())?;
		let value = HeaderValue::try_from(value).map_err(|_| invalid())?;

		self.headers.insert(name, value);

		Ok(())
	}

	/// Returns a header value as text, if present and valid UTF-8.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Returns the `Authorization` header, if present.
	pub fn authorization(&self) -> Option<&str> {
		self.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok())
	}
}

/// Fully buffered HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
	/// Response status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates a response with the given status and body and no headers.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de).map_err(|source| Error::Decode { source })
	}

	/// Returns the body as lossy UTF-8 text.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Thin wrapper around [`ReqwestClient`] that applies the client's timeout and body caps.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	config: ClientConfig,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport whose reqwest client enforces `config.timeout`.
	pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
		let timeout = std::time::Duration::try_from(config.timeout)
			.map_err(ConfigError::http_client_build)?;
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self { client, config })
	}

	/// Wraps an existing reqwest [`ReqwestClient`]; its own timeout settings take precedence.
	pub fn with_client(client: ReqwestClient, config: ClientConfig) -> Self {
		Self { client, config }
	}

	fn map_reqwest_error(&self, e: ReqwestError) -> Error {
		if e.is_timeout() {
			TransportError::Timeout { timeout: self.config.timeout }.into()
		} else {
			TransportError::network(e).into()
		}
	}

	async fn dispatch(&self, request: RequestContext) -> Result<HttpResponse> {
		let url = self.config.resolve(&request.target)?;
		let max_body = self.config.max_body_length;

		if let Some(size) = request.body.as_ref().map(Vec::len).filter(|size| *size > max_body) {
			return Err(TransportError::PayloadTooLarge { size, limit: max_body }.into());
		}

		let mut builder = self.client.request(request.method, url).headers(request.headers);

		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let mut response = builder.send().await.map_err(|e| self.map_reqwest_error(e))?;
		let status = response.status();
		let headers = response.headers().to_owned();
		let max_content = self.config.max_content_length;

		let declared =
			response.content_length().map(|len| usize::try_from(len).unwrap_or(usize::MAX));

		if let Some(size) = declared.filter(|size| *size > max_content) {
			return Err(TransportError::PayloadTooLarge { size, limit: max_content }.into());
		}

		let mut body = Vec::new();

		while let Some(chunk) = response.chunk().await.map_err(|e| self.map_reqwest_error(e))? {
			let size = body.len() + chunk.len();

			if size > max_content {
				return Err(TransportError::PayloadTooLarge { size, limit: max_content }.into());
			}

			body.extend_from_slice(&chunk);
		}

		if !status.is_success() {
			return Err(TransportError::Status {
				status: status.as_u16(),
				message: status_message(status, &body),
				retry_after: parse_retry_after(&headers),
				body,
			}
			.into());
		}

		Ok(HttpResponse { status, headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: RequestContext) -> TransportFuture<'_> {
		Box::pin(self.dispatch(request))
	}
}

/// Extracts the server's `message` field from a JSON error body, falling back to the status's
/// canonical reason.
pub fn status_message(status: StatusCode, body: &[u8]) -> String {
	#[derive(Deserialize)]
	struct ErrorBody {
		message: Option<String>,
		error: Option<String>,
	}

	serde_json::from_slice::<ErrorBody>(body)
		.ok()
		.and_then(|body| body.message.or(body.error))
		.filter(|message| !message.trim().is_empty())
		.unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_owned())
}

/// Parses a `Retry-After` header given either as delta-seconds or an HTTP date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return i64::try_from(secs).ok().map(Duration::seconds);
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn with_header_rejects_invalid_names() {
		let err = RequestContext::new(Method::GET, "/api")
			.with_header("bad header", "value")
			.expect_err("Header names with spaces should be rejected.");

		assert!(matches!(err, ConfigError::InvalidHeader { .. }));
	}

	#[test]
	fn with_json_sets_body_and_content_type() {
		let request = RequestContext::new(Method::POST, "/api/votes")
			.with_json(&serde_json::json!({ "choice": "pizza" }))
			.expect("JSON body should serialize.");

		assert_eq!(request.header("content-type"), Some("application/json"));
		assert_eq!(request.body.as_deref(), Some(&b"{\"choice\":\"pizza\"}"[..]));
	}

	#[test]
	fn json_reports_decode_path() {
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Payload {
			count: u32,
		}

		let response = HttpResponse::new(StatusCode::OK, &b"{\"count\":\"many\"}"[..]);
		let err = response.json::<Payload>().expect_err("String count should fail to decode.");

		match err {
			Error::Decode { source } => assert_eq!(source.path().to_string(), "count"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn status_message_prefers_body_message() {
		assert_eq!(
			status_message(StatusCode::FORBIDDEN, b"{\"message\":\"No votes left\"}"),
			"No votes left"
		);
		assert_eq!(status_message(StatusCode::FORBIDDEN, b"<html>"), "Forbidden");
	}

	#[test]
	fn retry_after_parses_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(30)));
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[test]
	fn retry_after_beyond_range_is_ignored() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("18446744073709551615"));

		assert_eq!(parse_retry_after(&headers), None);
	}
}
