//! Catalog schema migrations.

use crate::storage::migrations::Migration;

/// Schema of the catalog store, in version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Reference codes, groups and tracked objects",
        sql: r"
            CREATE TABLE IF NOT EXISTS reference_codes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                abbrev TEXT NOT NULL,
                name TEXT NOT NULL,
                adjective TEXT,
                UNIQUE (kind, abbrev)
            );

            CREATE TABLE IF NOT EXISTS sat_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS subgroups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_id INTEGER NOT NULL REFERENCES sat_groups(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                feed TEXT NOT NULL,
                UNIQUE (group_id, name)
            );

            CREATE TABLE IF NOT EXISTS objects (
                norad_id INTEGER PRIMARY KEY,
                cospar_id TEXT COLLATE NOCASE,
                launch_date INTEGER,
                decay_date INTEGER,
                status_id INTEGER REFERENCES reference_codes(id) ON DELETE SET NULL,
                owner_id INTEGER REFERENCES reference_codes(id) ON DELETE SET NULL,
                launch_site_id INTEGER REFERENCES reference_codes(id) ON DELETE SET NULL,
                orbital_fate_id INTEGER REFERENCES reference_codes(id) ON DELETE SET NULL,
                orbital_parent_id INTEGER REFERENCES reference_codes(id) ON DELETE SET NULL,
                orbital_period REAL,
                is_debris INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_objects_cospar ON objects(cospar_id);

            CREATE TABLE IF NOT EXISTS object_names (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                norad_id INTEGER NOT NULL REFERENCES objects(norad_id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                source INTEGER NOT NULL,
                is_canonical INTEGER NOT NULL DEFAULT 0,
                UNIQUE (norad_id, name, source)
            );

            CREATE INDEX IF NOT EXISTS idx_object_names_source ON object_names(source);

            CREATE TABLE IF NOT EXISTS group_members (
                norad_id INTEGER NOT NULL REFERENCES objects(norad_id) ON DELETE CASCADE,
                subgroup_id INTEGER NOT NULL REFERENCES subgroups(id) ON DELETE CASCADE,
                PRIMARY KEY (norad_id, subgroup_id)
            );
        ",
    },
    Migration {
        version: 2,
        description: "Capture epochs, orbits and epoch memberships",
        sql: r"
            CREATE TABLE IF NOT EXISTS capture_epochs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                timestamp REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_capture_epochs_timestamp
                ON capture_epochs(timestamp);

            CREATE TABLE IF NOT EXISTS orbits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                norad_id INTEGER NOT NULL REFERENCES objects(norad_id) ON DELETE CASCADE,
                epoch REAL NOT NULL,
                inclination REAL NOT NULL,
                eccentricity REAL NOT NULL,
                raan REAL NOT NULL,
                arg_periapsis REAL NOT NULL,
                mean_anomaly REAL NOT NULL,
                mean_motion REAL NOT NULL,
                mean_motion_dot REAL NOT NULL,
                mean_motion_ddot REAL NOT NULL,
                bstar REAL NOT NULL,
                magnitude REAL,
                source INTEGER NOT NULL,
                rev_count INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_orbits_norad_epoch ON orbits(norad_id, epoch);

            CREATE TABLE IF NOT EXISTS epoch_memberships (
                norad_id INTEGER NOT NULL REFERENCES objects(norad_id) ON DELETE CASCADE,
                epoch_id INTEGER NOT NULL REFERENCES capture_epochs(id) ON DELETE CASCADE,
                orbit_id INTEGER NOT NULL REFERENCES orbits(id) ON DELETE CASCADE,
                kind TEXT NOT NULL CHECK (kind IN ('measured', 'unchanged', 'carried')),
                PRIMARY KEY (norad_id, epoch_id)
            );

            CREATE INDEX IF NOT EXISTS idx_epoch_memberships_epoch ON epoch_memberships(epoch_id);
            CREATE INDEX IF NOT EXISTS idx_epoch_memberships_orbit ON epoch_memberships(orbit_id);
        ",
    },
];
