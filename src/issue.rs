//! Credential issuance: the registry facade plus the shared first-or-create state machine.
//!
//! Both registries resolve records through [`first_or_create`], which never relies on the
//! store enforcing uniqueness for correctness:
//!
//! ```text
//! LOOKUP -> found: (record, false)
//!        -> absent: GENERATE, INSERT (inside a checkpoint)
//!             ok       -> commit, (record, true)
//!             conflict -> rollback, RETRY_LOOKUP -> found: (record, false)
//!                                                -> absent: RecordNotFound
//! ```
//!
//! Credentials are drawn before the insert and written with the row, so no caller can observe
//! a stored record that lacks them.

pub mod generator;

mod consumer;
mod token;

pub use generator::*;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, CredentialTable, Resource, ResourceName},
	obs::{self, OpKind},
	store::{Checkpoint, KeyStore, StoreFuture},
};

/// Lookups performed after an insert loses a uniqueness race before giving up.
pub const LOOKUPS_AFTER_CONFLICT: usize = 1;

/// Issues consumers and tokens against a shared [`KeyStore`].
///
/// All work runs on the calling task; the registry spawns nothing and never commits or rolls
/// back an outer transaction the store may be running on the caller's behalf.
#[derive(Clone)]
pub struct Registry {
	/// Backing store for consumer, token, and resource rows.
	pub store: Arc<dyn KeyStore>,
	/// Generator used for freshly created rows.
	pub generator: CredentialGenerator,
}
impl Registry {
	/// Creates a registry with default credential sizing.
	pub fn new(store: Arc<dyn KeyStore>) -> Self {
		Self { store, generator: CredentialGenerator::default() }
	}

	/// Replaces the credential generator.
	pub fn with_generator(mut self, generator: CredentialGenerator) -> Self {
		self.generator = generator;

		self
	}

	/// Looks a resource up by name.
	///
	/// Resolve once at startup and hand the returned value to whoever needs it; the registry
	/// keeps no cache.
	pub async fn resolve_resource(&self, name: &ResourceName) -> Result<Resource> {
		self.store.find_resource(name).await?.ok_or_else(|| Error::RecordNotFound {
			entity: "Resource",
			identity: format!("name={name}"),
		})
	}
}
impl Debug for Registry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Registry").field("generator", &self.generator).finish()
	}
}

/// A record kind that can be resolved through [`first_or_create`].
pub(crate) trait CreateTarget
where
	Self: Send + Sync,
{
	type Record: Send;

	/// Entity label used in [`Error::RecordNotFound`].
	const ENTITY: &'static str;
	/// Operation label used for conflict metrics.
	const OP: OpKind;
	/// Table the fresh credentials must be unique within.
	const TABLE: CredentialTable;

	/// Human-readable identity used in errors and traces.
	fn describe(&self) -> String;

	/// Returns the first stored match, if any.
	fn find_first<'a>(&'a self, store: &'a dyn KeyStore) -> StoreFuture<'a, Option<Self::Record>>;

	/// Inserts a row carrying the identity fields and `credentials`.
	fn insert<'a>(
		&'a self,
		store: &'a dyn KeyStore,
		checkpoint: &'a Checkpoint,
		credentials: CredentialPair,
	) -> StoreFuture<'a, Self::Record>;
}

enum CreateState {
	Lookup,
	InsertAttempt,
	Conflict(Checkpoint),
	RetryLookup { remaining: usize },
}

/// Returns the first stored match for `target`, inserting one with credentials from
/// `generator` when none exists.
///
/// The boolean is `true` only for the caller whose insert succeeded.
pub(crate) async fn first_or_create<T>(
	store: &dyn KeyStore,
	generator: &CredentialGenerator,
	target: &T,
) -> Result<(T::Record, bool)>
where
	T: CreateTarget,
{
	let mut state = CreateState::Lookup;

	loop {
		state = match state {
			CreateState::Lookup => match target.find_first(store).await? {
				Some(record) => return Ok((record, false)),
				None => CreateState::InsertAttempt,
			},
			CreateState::InsertAttempt => {
				let credentials = generator.generate(store, T::TABLE).await?;
				let checkpoint = store.begin_checkpoint().await?;

				match target.insert(store, &checkpoint, credentials).await {
					Ok(record) => {
						store.commit_checkpoint(checkpoint).await?;

						return Ok((record, true));
					},
					Err(e) if e.is_uniqueness_violation() => CreateState::Conflict(checkpoint),
					Err(e) => {
						if let Err(rollback) = store.rollback_checkpoint(checkpoint).await {
							obs::trace_rollback_failure(T::ENTITY, &rollback);
						}

						return Err(e.into());
					},
				}
			},
			CreateState::Conflict(checkpoint) => {
				store.rollback_checkpoint(checkpoint).await?;
				obs::record_conflict(T::OP);
				obs::trace_conflict_recovery(T::ENTITY, &target.describe());

				CreateState::RetryLookup { remaining: LOOKUPS_AFTER_CONFLICT }
			},
			CreateState::RetryLookup { remaining } => match target.find_first(store).await? {
				Some(record) => return Ok((record, false)),
				None if remaining > 1 => CreateState::RetryLookup { remaining: remaining - 1 },
				None =>
					return Err(Error::RecordNotFound {
						entity: T::ENTITY,
						identity: target.describe(),
					}),
			},
		};
	}
}
