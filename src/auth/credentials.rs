//! Caller-supplied credentials for the client-credentials grant.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Client id/secret pair plus the tenant service group the grant is scoped to.
///
/// The cache performs no local validation; empty or unknown values surface as the
/// provider's own rejection of the token request.
#[derive(Clone)]
pub struct ClientCredentials {
	/// OAuth 2.0 client identifier, applied as HTTP basic auth.
	pub client_id: String,
	/// Confidential client secret, applied as HTTP basic auth.
	pub client_secret: TokenSecret,
	/// Tenant service group identifier the grant is scoped to.
	pub tsg_id: String,
}
impl ClientCredentials {
	/// Bundles the provided credential parts.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		tsg_id: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			tsg_id: tsg_id.into(),
		}
	}

	/// Formats the scope parameter tied to the tenant service group.
	pub fn scope(&self) -> String {
		format!("tsg_id:{}", self.tsg_id)
	}
}
impl Debug for ClientCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("tsg_id", &self.tsg_id)
			.finish()
	}
}
