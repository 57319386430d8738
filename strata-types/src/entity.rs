use serde::Serialize;
use serde::de::DeserializeOwned;

/// Contract a record type must satisfy to be managed by a Strata context.
///
/// The data-access layer never looks inside an entity beyond what this
/// trait exposes: entities cross the store boundary as opaque JSON
/// payloads, keyed by their collection name and logical identity. Two
/// values with the same [`id`](Entity::id) represent the same logical row.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + 'static {
    /// Name of the collection this entity type is stored under.
    ///
    /// Also used verbatim in error messages ("`Track` was not found...").
    fn entity_type() -> &'static str;

    /// Logical identity of this value within its collection.
    ///
    /// Must be stable for the lifetime of the row; the tracked-entity set
    /// and the store are both keyed by it.
    fn id(&self) -> String;
}
