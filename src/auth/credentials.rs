//! Public key + private secret pairs handed to consumers and tokens.

// self
use crate::{_prelude::*, auth::CredentialSecret};

/// Key/secret pair identifying a consumer or token to a remote resource.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Public key sent alongside every signed request.
	pub key: String,
	/// Private secret used to derive request signatures.
	pub secret: CredentialSecret,
}
impl CredentialPair {
	/// Builds a pair from raw strings.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { key: key.into(), secret: CredentialSecret::new(secret) }
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("key", &self.key)
			.field("secret", &"<redacted>")
			.finish()
	}
}

/// Record family whose rows must not share an identical key/secret combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialTable {
	/// Consumer rows.
	Consumers,
	/// Token rows.
	Tokens,
}
impl CredentialTable {
	/// Returns a stable label suitable for logs and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialTable::Consumers => "consumers",
			CredentialTable::Tokens => "tokens",
		}
	}
}
impl Display for CredentialTable {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
