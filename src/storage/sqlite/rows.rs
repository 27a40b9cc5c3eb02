//! Row conversion between catalog tables and model types.
//!
//! Each `*_COLUMNS` constant lists the columns its matching `*_from_row`
//! function expects, in order.

use crate::Error;
use crate::models::{
    CaptureEpoch, ElementSource, EpochId, EpochMembership, MembershipKind, NameSource, NoradId,
    ObjectName, OrbitId, OrbitalState, TrackedObject,
};
use rusqlite::Row;
use rusqlite::types::Type;

/// Columns read by [`object_from_row`].
pub const OBJECT_COLUMNS: &str = "norad_id, cospar_id, launch_date, decay_date, status_id, \
     owner_id, launch_site_id, orbital_fate_id, orbital_parent_id, orbital_period, is_debris";

/// Columns read by [`orbit_from_row`].
pub const ORBIT_COLUMNS: &str = "norad_id, epoch, inclination, eccentricity, raan, \
     arg_periapsis, mean_anomaly, mean_motion, mean_motion_dot, mean_motion_ddot, bstar, \
     magnitude, source, rev_count";

/// Columns read by [`membership_from_row`].
pub const MEMBERSHIP_COLUMNS: &str = "norad_id, epoch_id, orbit_id, kind";

/// Columns read by [`epoch_from_row`].
pub const EPOCH_COLUMNS: &str = "id, timestamp, run_id";

/// Columns read by [`name_from_row`].
pub const NAME_COLUMNS: &str = "norad_id, name, source, is_canonical";

fn invalid_column(index: usize, column_type: Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        column_type,
        Box::new(Error::InvalidInput(message)),
    )
}

/// Builds a [`TrackedObject`] from a row selected with [`OBJECT_COLUMNS`].
pub fn object_from_row(row: &Row<'_>) -> rusqlite::Result<TrackedObject> {
    Ok(TrackedObject {
        norad_id: NoradId::new(row.get(0)?),
        cospar_id: row.get(1)?,
        launch_date: row.get(2)?,
        decay_date: row.get(3)?,
        status: row.get(4)?,
        owner: row.get(5)?,
        launch_site: row.get(6)?,
        orbital_fate: row.get(7)?,
        orbital_parent: row.get(8)?,
        orbital_period: row.get(9)?,
        is_debris: row.get(10)?,
    })
}

/// Builds an [`OrbitalState`] from a row selected with [`ORBIT_COLUMNS`].
pub fn orbit_from_row(row: &Row<'_>) -> rusqlite::Result<OrbitalState> {
    let source_code: i64 = row.get(12)?;
    let source = ElementSource::from_code(source_code).ok_or_else(|| {
        invalid_column(12, Type::Integer, format!("unknown element source {source_code}"))
    })?;

    Ok(OrbitalState {
        norad_id: NoradId::new(row.get(0)?),
        epoch: row.get(1)?,
        inclination: row.get(2)?,
        eccentricity: row.get(3)?,
        raan: row.get(4)?,
        arg_periapsis: row.get(5)?,
        mean_anomaly: row.get(6)?,
        mean_motion: row.get(7)?,
        mean_motion_dot: row.get(8)?,
        mean_motion_ddot: row.get(9)?,
        bstar: row.get(10)?,
        magnitude: row.get(11)?,
        source,
        rev_count: row.get(13)?,
    })
}

/// Builds an [`EpochMembership`] from a row selected with [`MEMBERSHIP_COLUMNS`].
pub fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<EpochMembership> {
    let kind: String = row.get(3)?;
    let kind = MembershipKind::parse(&kind)
        .ok_or_else(|| invalid_column(3, Type::Text, format!("unknown membership kind '{kind}'")))?;

    Ok(EpochMembership {
        norad_id: NoradId::new(row.get(0)?),
        epoch_id: EpochId::new(row.get(1)?),
        orbit_id: OrbitId::new(row.get(2)?),
        kind,
    })
}

/// Builds a [`CaptureEpoch`] from a row selected with [`EPOCH_COLUMNS`].
pub fn epoch_from_row(row: &Row<'_>) -> rusqlite::Result<CaptureEpoch> {
    Ok(CaptureEpoch {
        id: EpochId::new(row.get(0)?),
        timestamp: row.get(1)?,
        run_id: row.get(2)?,
    })
}

/// Builds an [`ObjectName`] from a row selected with [`NAME_COLUMNS`].
pub fn name_from_row(row: &Row<'_>) -> rusqlite::Result<ObjectName> {
    let source_code: i64 = row.get(2)?;
    let source = NameSource::from_code(source_code).ok_or_else(|| {
        invalid_column(2, Type::Integer, format!("unknown name source {source_code}"))
    })?;

    Ok(ObjectName {
        norad_id: NoradId::new(row.get(0)?),
        name: row.get(1)?,
        source,
        is_canonical: row.get(3)?,
    })
}
