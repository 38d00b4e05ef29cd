//! Deserializable settings for credential generation and remote resources.

// self
use crate::{_prelude::*, error::ConfigError, sign::SignatureMethod};

/// Credential sizing used by [`crate::issue::CredentialGenerator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
	/// Length of the public key.
	pub key_len: usize,
	/// Length of the private secret.
	pub secret_len: usize,
}
impl GeneratorConfig {
	/// Default public key length.
	pub const KEY_LEN: usize = 18;
	/// Default private secret length.
	pub const SECRET_LEN: usize = 32;

	/// Rejects zero-length keys or secrets.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.key_len == 0 {
			return Err(ConfigError::InvalidCredentialLength { field: "key" });
		}
		if self.secret_len == 0 {
			return Err(ConfigError::InvalidCredentialLength { field: "secret" });
		}

		Ok(())
	}
}
impl Default for GeneratorConfig {
	fn default() -> Self {
		Self { key_len: Self::KEY_LEN, secret_len: Self::SECRET_LEN }
	}
}

/// Connection settings for a remote resource.
///
/// Certificate validation stays on unless `accept_invalid_certs` is set explicitly; only do so
/// for internal endpoints you already trust.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
	/// Base URL every request path is joined onto.
	pub base_url: String,
	/// Skips TLS certificate validation.
	#[serde(default)]
	pub accept_invalid_certs: bool,
	/// Whole-request timeout in seconds.
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	/// Signature method used by the default signer.
	#[serde(default)]
	pub signature_method: SignatureMethod,
}
impl ResourceConfig {
	/// Creates a config with certificate validation on and no timeout.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			accept_invalid_certs: false,
			timeout_secs: None,
			signature_method: SignatureMethod::default(),
		}
	}

	/// Opts out of TLS certificate validation.
	pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
		self.accept_invalid_certs = accept;

		self
	}

	/// Sets the whole-request timeout.
	pub fn timeout_secs(mut self, secs: u64) -> Self {
		self.timeout_secs = Some(secs);

		self
	}

	/// Overrides the signature method.
	pub fn signature_method(mut self, method: SignatureMethod) -> Self {
		self.signature_method = method;

		self
	}

	/// Ensures the base URL parses and uses an http(s) scheme.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
			url: self.base_url.clone(),
			reason: e.to_string(),
		})?;

		match url.scheme() {
			"http" | "https" => Ok(()),
			other => Err(ConfigError::InvalidBaseUrl {
				url: self.base_url.clone(),
				reason: format!("unsupported scheme `{other}`"),
			}),
		}
	}
}
