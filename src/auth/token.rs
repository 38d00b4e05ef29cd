//! Token records scoped to a consumer, token type, timestamp, and optional user.

// self
use crate::{
	_prelude::*,
	auth::{ConsumerName, CredentialPair, RecordId, UserId},
};

/// Kind of token issued to a consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
	/// Temporary credentials issued while a user authorizes the consumer.
	Request,
	/// Per-session credentials used to sign requests on behalf of a user.
	Access,
}
impl TokenType {
	/// Returns a stable label suitable for logs and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenType::Request => "request",
			TokenType::Access => "access",
		}
	}
}
impl Display for TokenType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Logical identity of a token. The store does not have to enforce its uniqueness.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenIdentity {
	/// Consumer the token was issued to.
	pub consumer: ConsumerName,
	/// Token kind.
	pub token_type: TokenType,
	/// Issue timestamp supplied by the caller (seconds).
	pub timestamp: i64,
	/// User the token acts for, if any.
	pub user: Option<UserId>,
}
impl TokenIdentity {
	/// Builds an identity without a user.
	pub fn new(consumer: ConsumerName, token_type: TokenType, timestamp: i64) -> Self {
		Self { consumer, token_type, timestamp, user: None }
	}

	/// Scopes the identity to a user.
	pub fn with_user(mut self, user: UserId) -> Self {
		self.user = Some(user);

		self
	}
}
impl Display for TokenIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"consumer={} token_type={} timestamp={} user={}",
			self.consumer,
			self.token_type,
			self.timestamp,
			self.user.as_deref().unwrap_or("<none>")
		)
	}
}

/// Stored token row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Store-assigned row identifier.
	pub id: RecordId,
	/// Logical identity fields.
	pub identity: TokenIdentity,
	/// Credentials drawn before the row was inserted; never replaced afterwards.
	pub credentials: CredentialPair,
}
impl Token {
	/// Creates a row for `identity`.
	pub fn new(id: RecordId, identity: TokenIdentity, credentials: CredentialPair) -> Self {
		Self { id, identity, credentials }
	}
}
