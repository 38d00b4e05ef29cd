//! Storage contracts and the built-in memory store for consumer, token, and resource rows.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{
		Consumer, ConsumerName, CredentialPair, CredentialTable, RecordId, Resource, ResourceName,
		Token, TokenIdentity, UserId,
	},
};

/// Boxed future returned by every [`KeyStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Repository contract consumed by the registries.
///
/// Inserts run inside a [`Checkpoint`] opened by the caller so a uniqueness violation can be
/// rolled back without disturbing any outer transaction the backend may be running.
pub trait KeyStore
where
	Self: Send + Sync,
{
	/// Fetches the consumer with the provided name, if present.
	fn find_consumer<'a>(&'a self, name: &'a ConsumerName) -> StoreFuture<'a, Option<Consumer>>;

	/// Inserts a consumer row carrying `credentials`, failing with
	/// [`StoreError::UniquenessViolation`] when the name is taken.
	fn insert_consumer<'a>(
		&'a self,
		checkpoint: &'a Checkpoint,
		name: ConsumerName,
		credentials: CredentialPair,
	) -> StoreFuture<'a, Consumer>;

	/// Overwrites the given profile fields of an existing consumer and returns the stored row.
	///
	/// `None` leaves the stored value alone. Credentials are never written here, so concurrent
	/// profile updates cannot clobber them.
	fn update_consumer_profile<'a>(
		&'a self,
		id: RecordId,
		description: Option<&'a str>,
		owner: Option<UserId>,
	) -> StoreFuture<'a, Consumer>;

	/// Returns all tokens matching the identity, ordered by [`crate::auth::RecordId`].
	fn find_tokens<'a>(&'a self, identity: &'a TokenIdentity) -> StoreFuture<'a, Vec<Token>>;

	/// Inserts a token row carrying `credentials`. Backends with an identity constraint fail
	/// with [`StoreError::UniquenessViolation`]; others may accept duplicates.
	fn insert_token<'a>(
		&'a self,
		checkpoint: &'a Checkpoint,
		identity: TokenIdentity,
		credentials: CredentialPair,
	) -> StoreFuture<'a, Token>;

	/// Reports whether any row of `table` already carries this exact key/secret pair.
	fn credentials_exist<'a>(
		&'a self,
		table: CredentialTable,
		pair: &'a CredentialPair,
	) -> StoreFuture<'a, bool>;

	/// Fetches the resource with the provided name, if present.
	fn find_resource<'a>(&'a self, name: &'a ResourceName) -> StoreFuture<'a, Option<Resource>>;

	/// Opens a nested checkpoint scoped to a single insert attempt.
	fn begin_checkpoint(&self) -> StoreFuture<'_, Checkpoint>;

	/// Keeps every write made under the checkpoint.
	fn commit_checkpoint(&self, checkpoint: Checkpoint) -> StoreFuture<'_, ()>;

	/// Discards every write made under the checkpoint.
	fn rollback_checkpoint(&self, checkpoint: Checkpoint) -> StoreFuture<'_, ()>;
}

/// Handle for a nested checkpoint (savepoint) opened by [`KeyStore::begin_checkpoint`].
///
/// Deliberately not `Clone`: committing or rolling back consumes it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Checkpoint(u64);
impl Checkpoint {
	/// Wraps a backend-specific checkpoint identifier.
	pub fn new(id: u64) -> Self {
		Self(id)
	}

	/// Returns the backend-specific identifier.
	pub fn id(&self) -> u64 {
		self.0
	}
}

/// Error type produced by [`KeyStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Insert collided with an existing row under a uniqueness guarantee.
	#[error("Uniqueness violation on {table}: {detail}.")]
	UniquenessViolation {
		/// Table that rejected the insert.
		table: String,
		/// Human-readable description of the conflicting values.
		detail: String,
	},
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
impl StoreError {
	/// Returns `true` for [`StoreError::UniquenessViolation`].
	pub fn is_uniqueness_violation(&self) -> bool {
		matches!(self, Self::UniquenessViolation { .. })
	}
}
