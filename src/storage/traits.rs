//! Storage trait definitions.
//!
//! Defines the interface every component talks to. A session represents one
//! open transaction: everything done through it becomes visible atomically
//! when the owner commits, and is discarded otherwise.

use crate::Result;
use crate::models::{
    CaptureEpoch, EpochId, EpochMembership, EpochSummary, NameSource, NoradId, ObjectName,
    OrbitId, OrbitalState, ReferenceCode, ReferenceKind, Subgroup, SubgroupFeed, SubgroupId,
    TrackedObject,
};

/// Transactional access to the satellite catalog and orbit history.
///
/// Components receive a session explicitly on every call; they never open
/// or commit transactions themselves.
pub trait CatalogSession {
    // =========================================================================
    // Reference codes
    // =========================================================================

    /// Inserts a reference code, or refreshes its name and adjective if the
    /// `(kind, abbrev)` pair already exists.
    ///
    /// # Returns
    ///
    /// The code's row identifier.
    fn upsert_reference(&self, code: &ReferenceCode) -> Result<i64>;

    /// Looks up the row identifier of a reference code by abbreviation.
    fn reference_id(&self, kind: ReferenceKind, abbrev: &str) -> Result<Option<i64>>;

    // =========================================================================
    // Groups
    // =========================================================================

    /// Returns the identifier of the named group, creating it if needed.
    fn ensure_group(&self, name: &str) -> Result<i64>;

    /// Creates a subgroup under a group, or updates its feed descriptor.
    fn upsert_subgroup(&self, group_id: i64, name: &str, feed: &SubgroupFeed)
    -> Result<SubgroupId>;

    /// Lists all subgroups with their parent group names, ordered by group then name.
    fn list_subgroups(&self) -> Result<Vec<Subgroup>>;

    /// Deletes every group membership.
    ///
    /// # Returns
    ///
    /// Number of memberships deleted.
    fn clear_group_members(&self) -> Result<u64>;

    /// Records an object as a member of a subgroup (no-op if already recorded).
    fn add_group_member(&self, norad_id: NoradId, subgroup: SubgroupId) -> Result<()>;

    /// Counts the members of a subgroup.
    fn count_group_members(&self, subgroup: SubgroupId) -> Result<u64>;

    // =========================================================================
    // Objects
    // =========================================================================

    /// Returns true if the object is in the catalog.
    fn object_exists(&self, norad_id: NoradId) -> Result<bool>;

    /// Fetches an object by NORAD ID.
    fn get_object(&self, norad_id: NoradId) -> Result<Option<TrackedObject>>;

    /// Inserts an attribute-less stub for the object.
    fn insert_object_stub(&self, norad_id: NoradId) -> Result<()>;

    /// Lists objects other than `excluding` holding the given secondary key.
    ///
    /// The comparison is a case-insensitive exact match.
    fn objects_with_cospar(&self, cospar_id: &str, excluding: NoradId) -> Result<Vec<NoradId>>;

    /// Deletes an object together with everything that refers to it.
    ///
    /// # Returns
    ///
    /// True if the object existed.
    fn delete_object(&self, norad_id: NoradId) -> Result<bool>;

    /// Overwrites every descriptive attribute of an existing object.
    fn update_object(&self, object: &TrackedObject) -> Result<()>;

    /// Marks an object as debris.
    fn set_debris(&self, norad_id: NoradId) -> Result<()>;

    // =========================================================================
    // Names
    // =========================================================================

    /// Deletes an object's names from one source.
    fn delete_names(&self, norad_id: NoradId, source: NameSource) -> Result<u64>;

    /// Deletes every name from one source.
    fn delete_names_from_source(&self, source: NameSource) -> Result<u64>;

    /// Clears the canonical flag on all of an object's names, whatever their source.
    fn demote_canonical_names(&self, norad_id: NoradId) -> Result<u64>;

    /// Inserts a name; an existing `(object, name, source)` row is reused and
    /// only gains the canonical flag, never loses it.
    fn upsert_name(&self, name: &ObjectName) -> Result<()>;

    /// Lists an object's names.
    fn names_for(&self, norad_id: NoradId) -> Result<Vec<ObjectName>>;

    // =========================================================================
    // Capture epochs
    // =========================================================================

    /// Registers a new capture epoch.
    fn insert_epoch(&self, timestamp: f64, run_id: &str) -> Result<CaptureEpoch>;

    /// Returns the epoch immediately preceding `epoch` in timestamp order.
    fn previous_epoch(&self, epoch: &CaptureEpoch) -> Result<Option<CaptureEpoch>>;

    /// Returns the most recent epochs with their membership breakdown, newest first.
    fn recent_epochs(&self, limit: usize) -> Result<Vec<EpochSummary>>;

    // =========================================================================
    // Orbits
    // =========================================================================

    /// Finds a stored orbit of the object whose epoch lies within
    /// `tolerance` of `epoch` (inclusive).
    fn find_orbit_near(&self, norad_id: NoradId, epoch: f64, tolerance: f64)
    -> Result<Option<OrbitId>>;

    /// Persists a new orbit.
    fn insert_orbit(&self, state: &OrbitalState) -> Result<OrbitId>;

    /// Fetches a stored orbit.
    fn get_orbit(&self, orbit_id: OrbitId) -> Result<Option<OrbitalState>>;

    // =========================================================================
    // Epoch memberships
    // =========================================================================

    /// Fetches the membership of an object in an epoch.
    fn get_membership(&self, norad_id: NoradId, epoch_id: EpochId)
    -> Result<Option<EpochMembership>>;

    /// Inserts a membership.
    ///
    /// Fails if the object already has a membership in the epoch.
    fn insert_membership(&self, membership: &EpochMembership) -> Result<()>;

    /// Deletes the duplicate memberships of an epoch, whether the merger
    /// reused the orbit or the gap-filler carried it.
    fn delete_duplicate_memberships(&self, epoch_id: EpochId) -> Result<u64>;

    /// Lists memberships of `previous` whose object has none in `current`.
    fn memberships_missing_from(
        &self,
        previous: EpochId,
        current: EpochId,
    ) -> Result<Vec<EpochMembership>>;

    /// Returns the timestamp of the earliest epoch in which the orbit was
    /// recorded as a new (non-duplicate) measurement.
    fn genuine_origin(&self, orbit_id: OrbitId) -> Result<Option<f64>>;

    /// Lists all memberships of an epoch.
    fn memberships_for_epoch(&self, epoch_id: EpochId) -> Result<Vec<EpochMembership>>;
}
