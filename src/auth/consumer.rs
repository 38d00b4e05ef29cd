//! Consumer records: named API clients holding one credential pair for their lifetime.

// self
use crate::{
	_prelude::*,
	auth::{ConsumerName, CredentialPair, RecordId, UserId},
};

/// Stored API consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
	/// Store-assigned row identifier.
	pub id: RecordId,
	/// Unique consumer name.
	pub name: ConsumerName,
	/// Free-form description shown to administrators.
	pub description: Option<String>,
	/// User owning the consumer, if any.
	pub owner: Option<UserId>,
	/// Credentials drawn before the row was inserted; never replaced afterwards.
	pub credentials: CredentialPair,
}
impl Consumer {
	/// Creates a row with no description or owner.
	pub fn new(id: RecordId, name: ConsumerName, credentials: CredentialPair) -> Self {
		Self { id, name, description: None, owner: None, credentials }
	}

	/// Applies optional owner/description updates, returning `true` when anything changed.
	pub fn apply_profile(&mut self, description: Option<&str>, owner: Option<UserId>) -> bool {
		let mut changed = false;

		if let Some(owner) = owner
			&& self.owner.as_ref() != Some(&owner)
		{
			self.owner = Some(owner);
			changed = true;
		}
		if let Some(description) = description
			&& self.description.as_deref() != Some(description)
		{
			self.description = Some(description.to_owned());
			changed = true;
		}

		changed
	}
}
