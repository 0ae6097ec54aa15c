//! HTTP client facade that runs every call through the interceptor pipeline.

// self
use crate::{
	_prelude::*,
	auth::TokenAccessor,
	config::ClientConfig,
	http::{HeaderMap, HttpResponse, HttpTransport, Method, RequestContext},
	interceptor::{AuthInterceptor, DiagnosticsInterceptor, RequestInterceptor, ResponseInterceptor},
	obs::{self, CallOutcome, CallSpan, DiagnosticSink, TracingSink},
	rate_limit::{Clock, SlidingWindowLimiter, SystemClock},
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = Client<ReqwestTransport>;

/// Composed HTTP client exposing the usual verbs over an [`HttpTransport`].
///
/// Each client owns its own sliding-window limiter, so independent clients (one per process in
/// production, one per test in suites) never share rate-limit state. The request chain always
/// starts with an [`AuthInterceptor`] and the response chain with a [`DiagnosticsInterceptor`];
/// hooks registered through [`ClientBuilder`] run after them in registration order.
pub struct Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every dispatch.
	pub transport: Arc<T>,
	config: Arc<ClientConfig>,
	accessor: TokenAccessor,
	limiter: Arc<SlidingWindowLimiter>,
	request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
	response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}
impl<T> Client<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client over `transport` with the default clock and diagnostics sink.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		ClientBuilder::new(config).store(store).build_with_transport(transport)
	}

	/// Returns the configuration shared by every call.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Returns the accessor used to look up the bearer token.
	pub fn token_accessor(&self) -> &TokenAccessor {
		&self.accessor
	}

	/// Returns this client's rate limiter.
	pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
		&self.limiter
	}

	/// Joins `path` onto the configured base URL.
	pub fn endpoint(&self, path: &str) -> String {
		self.config.endpoint(path)
	}

	/// Issues a `GET` request.
	pub async fn get(&self, target: &str) -> Result<HttpResponse> {
		self.send(RequestContext::new(Method::GET, target)).await
	}

	/// Issues a `GET` request carrying additional headers.
	pub async fn get_with_headers(&self, target: &str, headers: HeaderMap) -> Result<HttpResponse> {
		self.send(RequestContext::new(Method::GET, target).with_headers(headers)).await
	}

	/// Issues a `DELETE` request.
	pub async fn delete(&self, target: &str) -> Result<HttpResponse> {
		self.send(RequestContext::new(Method::DELETE, target)).await
	}

	/// Issues a `POST` request with a JSON body.
	pub async fn post<B>(&self, target: &str, body: &B) -> Result<HttpResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send_json(Method::POST, target, body).await
	}

	/// Issues a `PUT` request with a JSON body.
	pub async fn put<B>(&self, target: &str, body: &B) -> Result<HttpResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send_json(Method::PUT, target, body).await
	}

	/// Issues a `PATCH` request with a JSON body.
	pub async fn patch<B>(&self, target: &str, body: &B) -> Result<HttpResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send_json(Method::PATCH, target, body).await
	}

	/// Runs `request` through the interceptor chains and the transport.
	pub async fn send(&self, request: RequestContext) -> Result<HttpResponse> {
		let span = CallSpan::new(request.method.as_str(), "send");

		span.instrument(self.run(Ok(request))).await
	}

	async fn send_json<B>(&self, method: Method, target: &str, body: &B) -> Result<HttpResponse>
	where
		B: ?Sized + Serialize,
	{
		let span = CallSpan::new(method.as_str(), "send");
		// Serialization failures enter the request chain like any other construction error.
		let request = RequestContext::new(method, target).with_json(body).map_err(Error::from);

		span.instrument(self.run(request)).await
	}

	async fn run(&self, request: Result<RequestContext>) -> Result<HttpResponse> {
		obs::record_call_outcome(CallOutcome::Attempt);

		let mut request = request;

		for interceptor in &self.request_interceptors {
			request = match request {
				Ok(context) => interceptor.on_request(context),
				Err(e) => interceptor.on_request_error(e),
			};
		}

		let dispatched = request.is_ok();
		let mut outcome = match request {
			Ok(context) => self.transport.execute(context).await,
			Err(e) => Err(e),
		};

		for interceptor in &self.response_interceptors {
			outcome = match outcome {
				Ok(response) => interceptor.on_success(response),
				Err(e) => interceptor.on_failure(e),
			};
		}

		obs::record_call_outcome(match (&outcome, dispatched) {
			(Ok(_), _) => CallOutcome::Success,
			(Err(_), false) => CallOutcome::Rejected,
			(Err(_), true) => CallOutcome::Failure,
		});

		outcome
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Creates a reqwest-backed client for `config`, reading tokens from `store`.
	pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ConfigError> {
		ClientBuilder::new(config).store(store).build()
	}
}
impl<T> Clone for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			config: Arc::clone(&self.config),
			accessor: self.accessor.clone(),
			limiter: Arc::clone(&self.limiter),
			request_interceptors: self.request_interceptors.clone(),
			response_interceptors: self.response_interceptors.clone(),
		}
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("config", &self.config)
			.field("accessor", &self.accessor)
			.field("request_interceptors", &self.request_interceptors.len())
			.field("response_interceptors", &self.response_interceptors.len())
			.finish()
	}
}

/// Builder assembling a [`Client`] and its default interceptors.
pub struct ClientBuilder {
	config: ClientConfig,
	store: Option<Arc<dyn TokenStore>>,
	clock: Arc<dyn Clock>,
	sink: Arc<dyn DiagnosticSink>,
	request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
	response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}
impl ClientBuilder {
	/// Creates a builder with the system clock, tracing sink, and no token store.
	pub fn new(config: ClientConfig) -> Self {
		Self {
			config,
			store: None,
			clock: Arc::new(SystemClock),
			sink: Arc::new(TracingSink),
			request_interceptors: Vec::new(),
			response_interceptors: Vec::new(),
		}
	}

	/// Sets the store the bearer token is read from.
	pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Overrides the clock the rate limiter observes.
	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides where diagnostics are reported.
	pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
		self.sink = sink;

		self
	}

	/// Appends a request interceptor after the built-in auth/rate-limit hook.
	pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
		self.request_interceptors.push(interceptor);

		self
	}

	/// Appends a response interceptor after the built-in diagnostics hook.
	pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
		self.response_interceptors.push(interceptor);

		self
	}

	/// Builds a client over the provided transport.
	pub fn build_with_transport<T>(self, transport: impl Into<Arc<T>>) -> Client<T>
	where
		T: ?Sized + HttpTransport,
	{
		let Self { config, store, clock, sink, request_interceptors, response_interceptors } =
			self;
		let accessor = store
			.map(TokenAccessor::new)
			.unwrap_or_else(TokenAccessor::unavailable)
			.with_key(config.token_key.clone())
			.with_sink(Arc::clone(&sink));
		let limiter = Arc::new(SlidingWindowLimiter::new(config.rate_limit));
		let auth: Arc<dyn RequestInterceptor> =
			Arc::new(AuthInterceptor::new(accessor.clone(), Arc::clone(&limiter), clock));
		let diagnostics: Arc<dyn ResponseInterceptor> =
			Arc::new(DiagnosticsInterceptor::new(sink));

		Client {
			transport: transport.into(),
			config: Arc::new(config),
			accessor,
			limiter,
			request_interceptors: std::iter::once(auth).chain(request_interceptors).collect(),
			response_interceptors: std::iter::once(diagnostics)
				.chain(response_interceptors)
				.collect(),
		}
	}

	/// Builds a client over a reqwest transport configured from the builder's settings.
	#[cfg(feature = "reqwest")]
	pub fn build(self) -> Result<Client<ReqwestTransport>, ConfigError> {
		let transport = ReqwestTransport::new(self.config.clone())?;

		Ok(self.build_with_transport(transport))
	}
}
impl Debug for ClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientBuilder")
			.field("config", &self.config)
			.field("store_set", &self.store.is_some())
			.finish()
	}
}
