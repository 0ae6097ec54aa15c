//! Vote tally lookups for the signed-in user.

// crates.io
use ::http::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	client::Client,
	http::{HeaderMap, HeaderValue, HttpTransport},
};

/// Path of the vote tally endpoint, relative to the API base URL.
pub const VOTES_PATH: &str = "/users/votes";

/// Vote counters returned by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
	/// Votes the user has cast so far.
	pub total_votes: i64,
	/// Votes the user may still cast.
	pub votes_remaining: i64,
}

#[derive(Deserialize)]
struct Envelope<T> {
	data: T,
}

/// Fetches vote counters through a [`Client`].
///
/// The service performs no error translation: transport failures and non-success statuses reach
/// the caller exactly as the client produced them.
pub struct VoteService<T>
where
	T: ?Sized + HttpTransport,
{
	client: Client<T>,
}
impl<T> VoteService<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps `client`.
	pub fn new(client: Client<T>) -> Self {
		Self { client }
	}

	/// Returns the wrapped client.
	pub fn client(&self) -> &Client<T> {
		&self.client
	}

	/// Returns the absolute or origin-relative URL of the tally endpoint.
	pub fn votes_url(&self) -> String {
		self.client.endpoint(VOTES_PATH)
	}

	/// Fetches the tally for the user whose token is in the store.
	pub async fn votes(&self) -> Result<VoteTally> {
		let response = self.client.get_with_headers(&self.votes_url(), self.auth_headers()).await?;
		let envelope: Envelope<VoteTally> = response.json()?;

		Ok(envelope.data)
	}

	fn auth_headers(&self) -> HeaderMap {
		let mut headers = HeaderMap::new();

		// Unencodable tokens are left to the auth interceptor, which fails the call.
		if let Some(value) =
			self.client.token_accessor().bearer().and_then(|b| HeaderValue::try_from(b).ok())
		{
			headers.insert(AUTHORIZATION, value);
		}

		headers
	}
}
impl<T> Clone for VoteService<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { client: self.client.clone() }
	}
}
impl<T> Debug for VoteService<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("VoteService").field("client", &self.client).finish()
	}
}
