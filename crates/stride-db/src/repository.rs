use crate::DbResult;

/// Persistence contract shared by every resource.
///
/// Identifiers arrive as raw strings: a malformed one is
/// [`DbError::InvalidIdentifier`](crate::DbError::InvalidIdentifier), a well-formed
/// one that matches nothing is `Ok(None)`.
pub trait Repository {
    type Record;
    type New;
    type Patch;
    type Filter: Default;

    fn create(&self, new: Self::New) -> DbResult<Self::Record>;

    fn get_by_id(&self, id: &str) -> DbResult<Option<Self::Record>>;

    /// Every record matching `filter`; the default filter matches all.
    fn get_all(&self, filter: &Self::Filter) -> DbResult<Vec<Self::Record>>;

    /// Field-level merge. Fields the patch leaves absent keep their values.
    fn update(&self, id: &str, patch: Self::Patch) -> DbResult<Option<Self::Record>>;

    /// Returns the removed record.
    fn delete(&self, id: &str) -> DbResult<Option<Self::Record>>;
}
