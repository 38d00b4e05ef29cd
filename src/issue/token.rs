//! Token registry: race-safe first-or-create keyed by the token's logical identity.
//!
//! Stores are not required to enforce uniqueness of [`TokenIdentity`]. Lookups therefore take
//! the first match in insertion order instead of insisting on exactly one, so a duplicate
//! left behind by an earlier race never turns into a hard failure.

// self
use crate::{
	_prelude::*,
	auth::{Consumer, CredentialPair, CredentialTable, Token, TokenIdentity, TokenType, UserId},
	issue::{self, CreateTarget, Registry},
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::{Checkpoint, KeyStore, StoreFuture},
};

struct TokenTarget<'i> {
	identity: &'i TokenIdentity,
}
impl CreateTarget for TokenTarget<'_> {
	type Record = Token;

	const ENTITY: &'static str = "Token";
	const OP: OpKind = OpKind::CreateToken;
	const TABLE: CredentialTable = CredentialTable::Tokens;

	fn describe(&self) -> String {
		self.identity.to_string()
	}

	fn find_first<'a>(&'a self, store: &'a dyn KeyStore) -> StoreFuture<'a, Option<Token>> {
		Box::pin(async move { Ok(store.find_tokens(self.identity).await?.into_iter().next()) })
	}

	fn insert<'a>(
		&'a self,
		store: &'a dyn KeyStore,
		checkpoint: &'a Checkpoint,
		credentials: CredentialPair,
	) -> StoreFuture<'a, Token> {
		store.insert_token(checkpoint, self.identity.clone(), credentials)
	}
}

impl Registry {
	/// Resolves the token for `identity`, inserting it with fresh credentials when absent.
	///
	/// Returns `(token, true)` only for the caller whose insert won; every other caller,
	/// including race losers, gets `(first_match, false)` carrying the stored credentials.
	pub async fn first_or_create_token(&self, identity: &TokenIdentity) -> Result<(Token, bool)> {
		issue::first_or_create(self.store.as_ref(), &self.generator, &TokenTarget { identity })
			.await
	}

	/// Returns the token issued to `consumer` for this type/timestamp/user, creating it with
	/// fresh credentials on first use.
	pub async fn create_token(
		&self,
		consumer: &Consumer,
		token_type: TokenType,
		timestamp: i64,
		user: Option<UserId>,
	) -> Result<Token> {
		const KIND: OpKind = OpKind::CreateToken;

		let span = OpSpan::new(KIND, "create_token");
		let identity =
			TokenIdentity { consumer: consumer.name.clone(), token_type, timestamp, user };

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let (token, _) = self.first_or_create_token(&identity).await?;

				Ok(token)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}
}
