//! Interceptor-driven HTTP client for the voting API with bearer-token injection and
//! sliding-window rate limiting built in.
//!
//! Every outbound call made through [`client::Client`] runs the same pipeline: request
//! interceptors attach the stored bearer token and consult the per-client rate limiter, the
//! transport dispatches the request, and response interceptors classify failures before handing
//! the untouched outcome back to the caller.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod obs;
pub mod rate_limit;
pub mod store;
pub mod votes;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, tokio as _};
