//! Request and response hooks run around every dispatch.
//!
//! The client threads a single `Result` through each chain. A request interceptor receives the
//! context through [`RequestInterceptor::on_request`] while the chain is healthy and the error
//! through [`RequestInterceptor::on_request_error`] once an earlier hook failed; response
//! interceptors mirror this with [`ResponseInterceptor::on_success`] and
//! [`ResponseInterceptor::on_failure`]. The default implementations are identity passthroughs.

// crates.io
use ::http::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	auth::TokenAccessor,
	error::{RateLimitExceeded, TIMEOUT_CODE},
	http::{HttpResponse, RequestContext},
	obs::{Diagnostic, DiagnosticSink, TracingSink},
	rate_limit::{Clock, RateLimitDecision, SlidingWindowLimiter},
};

/// Hook invoked before a request is dispatched.
pub trait RequestInterceptor
where
	Self: Send + Sync,
{
	/// Inspects, augments, or vetoes the outgoing request.
	fn on_request(&self, request: RequestContext) -> Result<RequestContext>;

	/// Observes an error raised earlier in the request chain; forwards it unchanged by default.
	fn on_request_error(&self, error: Error) -> Result<RequestContext> {
		Err(error)
	}
}

/// Hook invoked after the transport (or an earlier hook) produced an outcome.
pub trait ResponseInterceptor
where
	Self: Send + Sync,
{
	/// Observes a successful response; identity by default.
	fn on_success(&self, response: HttpResponse) -> Result<HttpResponse> {
		Ok(response)
	}

	/// Observes a failure; forwards it unchanged by default.
	fn on_failure(&self, error: Error) -> Result<HttpResponse> {
		Err(error)
	}
}

/// Attaches the stored bearer token and enforces the client's sliding-window limit.
pub struct AuthInterceptor {
	accessor: TokenAccessor,
	limiter: Arc<SlidingWindowLimiter>,
	clock: Arc<dyn Clock>,
}
impl AuthInterceptor {
	/// Creates an interceptor reading tokens through `accessor` and consulting `limiter`.
	pub fn new(
		accessor: TokenAccessor,
		limiter: Arc<SlidingWindowLimiter>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self { accessor, limiter, clock }
	}

	/// Returns the limiter shared with this interceptor.
	pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
		&self.limiter
	}
}
impl RequestInterceptor for AuthInterceptor {
	fn on_request(&self, mut request: RequestContext) -> Result<RequestContext> {
		// An unencodable token fails the call before the limiter counts it.
		if let Some(bearer) = self.accessor.bearer() {
			request.set_header(AUTHORIZATION.as_str(), &bearer)?;
		}

		let policy = self.limiter.policy();

		match self.limiter.check_and_record(self.clock.now()) {
			RateLimitDecision::Accept => Ok(request),
			RateLimitDecision::Reject(retry) => Err(RateLimitExceeded {
				limit: policy.max_requests(),
				window: policy.window(),
				retry,
			}
			.into()),
		}
	}
}
impl Debug for AuthInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthInterceptor")
			.field("accessor", &self.accessor)
			.field("limiter", &self.limiter)
			.finish()
	}
}

/// Classifies failures for operators and forwards every outcome untouched.
#[derive(Clone)]
pub struct DiagnosticsInterceptor {
	sink: Arc<dyn DiagnosticSink>,
}
impl DiagnosticsInterceptor {
	/// Creates an interceptor reporting to `sink`.
	pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
		Self { sink }
	}

	/// Returns every diagnostic that applies to `error`.
	pub fn classify(error: &Error) -> Vec<Diagnostic> {
		let mut diagnostics = Vec::new();

		if error.code() == Some(TIMEOUT_CODE) {
			diagnostics.push(Diagnostic::Timeout);
		}
		if error.to_string().to_lowercase().contains("rate limit") {
			diagnostics.push(Diagnostic::Throttled);
		}

		diagnostics
	}
}
impl Default for DiagnosticsInterceptor {
	fn default() -> Self {
		Self::new(Arc::new(TracingSink))
	}
}
impl ResponseInterceptor for DiagnosticsInterceptor {
	fn on_failure(&self, error: Error) -> Result<HttpResponse> {
		let classified = Self::classify(&error);

		if !classified.is_empty() {
			let detail = error.to_string();

			for diagnostic in classified {
				self.sink.emit(diagnostic, &detail);
			}
		}

		Err(error)
	}
}
impl Debug for DiagnosticsInterceptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("DiagnosticsInterceptor(..)")
	}
}
