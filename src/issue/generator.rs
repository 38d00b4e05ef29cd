//! Random key/secret generation with a collision check against stored credentials.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, CredentialSecret, CredentialTable},
	config::GeneratorConfig,
	error::ConfigError,
	store::KeyStore,
};

/// Characters used for keys and secrets; visually ambiguous glyphs (`i l o I O 0 1`) are left out.
pub const CREDENTIAL_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Draws credential pairs that no existing row of the target table already holds.
#[derive(Clone, Copy, Debug, Default)]
pub struct CredentialGenerator {
	config: GeneratorConfig,
}
impl CredentialGenerator {
	/// Builds a generator after validating the configured lengths.
	pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self { config })
	}

	/// Returns the active sizing.
	pub fn config(&self) -> GeneratorConfig {
		self.config
	}

	/// Draws a key and secret, redrawing only the secret while the exact pair is already
	/// present in `table`.
	///
	/// There is no retry bound: the key space dwarfs any realistic row count.
	pub async fn generate(
		&self,
		store: &dyn KeyStore,
		table: CredentialTable,
	) -> Result<CredentialPair> {
		let mut pair = CredentialPair::new(
			random_string(self.config.key_len),
			random_string(self.config.secret_len),
		);

		while store.credentials_exist(table, &pair).await? {
			pair.secret = CredentialSecret::new(random_string(self.config.secret_len));
		}

		Ok(pair)
	}
}

fn random_string(len: usize) -> String {
	let mut rng = rand::rng();

	(0..len)
		.map(|_| char::from(CREDENTIAL_ALPHABET[rng.random_range(0..CREDENTIAL_ALPHABET.len())]))
		.collect()
}
