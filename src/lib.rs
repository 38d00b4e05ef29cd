//! Race-safe consumer and token credential issuance, paired with an OAuth 1.0 signed request
//! client for talking to remote resources with those credentials.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod issue;
pub mod obs;
pub mod sign;
pub mod store;
pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ConsumerName, CredentialPair},
		issue::Registry,
		store::{KeyStore, MemoryStore},
	};

	/// Builds a registry backed by a fresh in-memory store and returns both handles.
	pub fn build_test_registry() -> (Registry, Arc<MemoryStore>) {
		let backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn KeyStore> = backend.clone();

		(Registry::new(store), backend)
	}

	/// Parses a consumer name fixture.
	pub fn consumer_name(value: &str) -> ConsumerName {
		ConsumerName::new(value).expect("Consumer name fixture should be valid.")
	}

	/// Fixed credential pair used by client tests.
	pub fn test_credentials() -> CredentialPair {
		CredentialPair::new("warehouse", "lerolero")
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_transport() -> crate::transport::ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		crate::transport::ReqwestTransport::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::{Arc, OnceLock},
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
