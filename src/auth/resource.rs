//! Named remote resources registered alongside consumers.

// self
use crate::{
	_prelude::*,
	auth::{RecordId, ResourceName},
};

/// Stored resource row.
///
/// Resolve the resource once (see [`crate::issue::Registry::resolve_resource`]) and pass the
/// value to the code that needs it instead of caching it globally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
	/// Store-assigned row identifier.
	pub id: RecordId,
	/// Unique resource name.
	pub name: ResourceName,
}
