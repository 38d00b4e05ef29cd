//! Keyring-level error types shared across registries, signers, and the request client.

// self
use crate::_prelude::*;

/// Keyring-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Remote call failed or answered with a non-2xx status.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Request could not be signed.
	#[error(transparent)]
	Sign(#[from] crate::sign::SignError),

	/// A lookup that had to succeed found nothing.
	#[error("{entity} matching query does not exist: {identity}.")]
	RecordNotFound {
		/// Record kind being sought.
		entity: &'static str,
		/// Human-readable description of the sought identity.
		identity: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Request parameters could not be rendered as JSON.
	#[error("Request body could not be encoded.")]
	BodyEncoding(#[source] serde_json::Error),
	/// Base URL cannot be parsed or uses an unsupported scheme.
	#[error("Base URL `{url}` is invalid: {reason}.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
		/// Why the URL was rejected.
		reason: String,
	},
	/// Credential length settings are unusable.
	#[error("Credential {field} length must be greater than zero.")]
	InvalidCredentialLength {
		/// Which length was rejected (`key` or `secret`).
		field: &'static str,
	},
	/// An identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures talking to the remote resource.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The remote answered with a status outside the 2xx class.
	#[error("Request {method} '{uri}' failed as ({status} - {reason}).")]
	Status {
		/// HTTP method of the failed request.
		method: String,
		/// Full request URI.
		uri: String,
		/// Numeric status code.
		status: u16,
		/// Canonical reason phrase for the status.
		reason: String,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote resource.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote resource.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Builds a status error, deriving the reason phrase from the code.
	pub fn status(method: &http::Method, uri: impl Into<String>, status: u16) -> Self {
		let reason = http::StatusCode::from_u16(status)
			.ok()
			.and_then(|code| code.canonical_reason())
			.unwrap_or("Unknown")
			.to_owned();

		Self::Status { method: method.to_string(), uri: uri.into(), status, reason }
	}

	/// Returns the HTTP status for [`TransportError::Status`].
	pub fn status_code(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// A non-empty body was not valid JSON for the requested type.
	#[error("Remote resource returned malformed JSON.")]
	Json {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_error_renders_method_uri_and_reason() {
		let err = TransportError::status(&http::Method::GET, "http://h/a/b", 404);

		assert_eq!(err.status_code(), Some(404));
		assert_eq!(err.to_string(), "Request GET 'http://h/a/b' failed as (404 - Not Found).");
	}

	#[test]
	fn unknown_status_falls_back_to_generic_reason() {
		let err = TransportError::status(&http::Method::PUT, "http://h/x", 599);

		assert!(matches!(err, TransportError::Status { ref reason, .. } if reason == "Unknown"));
	}

	#[test]
	fn record_not_found_names_identity() {
		let err = Error::RecordNotFound { entity: "Token", identity: "consumer=x".into() };

		assert_eq!(err.to_string(), "Token matching query does not exist: consumer=x.");
	}
}
