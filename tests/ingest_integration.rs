//! Integration tests for catalog reconciliation and element ingestion.
//!
//! Every test runs against an in-memory catalog database and goes through
//! the public services only.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::too_many_lines,
    clippy::float_cmp,
    clippy::doc_markdown
)]

use std::collections::HashMap;

use satlog::feeds::{AnnexEntry, AnnexName, DecodeContext, DecodedElements, MagnitudeTable, parse_elements};
use satlog::models::{
    CatalogRecord, ElementSource, IngestReport, MembershipKind, NameSource, NoradId, OrbitalState,
};
use satlog::services::{CatalogReconciler, FeedBatch, IngestService, NameNormalizer};
use satlog::{CatalogSession, IngestSettings, SqliteSession, SqliteStore};

const DAY: f64 = 86_400.0;
const T0: f64 = 1_700_000_000.0;

const ISS: &str = "ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537
";

fn record(norad: u32, cospar: &str, name: &str) -> CatalogRecord {
    CatalogRecord {
        norad_id: NoradId::new(norad),
        cospar_id: Some(cospar.to_string()).filter(|c| !c.is_empty()),
        name: name.to_string(),
        ..CatalogRecord::default()
    }
}

fn elements(norad: u32, epoch: f64) -> DecodedElements {
    DecodedElements {
        norad_id: NoradId::new(norad),
        state: OrbitalState {
            norad_id: NoradId::new(norad),
            epoch,
            inclination: 97.5,
            eccentricity: 0.0012,
            raan: 10.0,
            arg_periapsis: 20.0,
            mean_anomaly: 30.0,
            mean_motion: 14.9,
            mean_motion_dot: 0.0,
            mean_motion_ddot: 0.0,
            bstar: 0.000_02,
            magnitude: None,
            source: ElementSource::Celestrak,
            rev_count: 1000,
        },
    }
}

fn batch(records: Vec<DecodedElements>) -> Vec<FeedBatch> {
    vec![FeedBatch::from_elements(None, records, 0)]
}

fn catalog(session: &SqliteSession<'_>, norads: &[u32]) {
    let records: Vec<CatalogRecord> = norads
        .iter()
        .map(|&norad| record(norad, &format!("2020-{norad:03}A"), &format!("OBJECT {norad}")))
        .collect();
    CatalogReconciler::default().reconcile(session, &records).unwrap();
}

fn run(session: &SqliteSession<'_>, batches: &[FeedBatch], timestamp: f64) -> IngestReport {
    IngestService::default().run(session, batches, timestamp).unwrap()
}

#[test]
fn test_republished_orbit_at_exact_tolerance_is_unchanged() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    catalog(&session, &[1]);

    let first = run(&session, &batch(vec![elements(1, T0 - DAY)]), T0);
    assert_eq!(first.inserted, 1);

    let second = run(&session, &batch(vec![elements(1, T0 - DAY + 1.0)]), T0 + DAY);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.unchanged, 1);
}

#[test]
fn test_orbit_beyond_tolerance_is_inserted() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    catalog(&session, &[1]);

    run(&session, &batch(vec![elements(1, T0 - DAY)]), T0);
    let second = run(&session, &batch(vec![elements(1, T0 - DAY + 1.5)]), T0 + DAY);
    assert_eq!(second.inserted, 1);
    assert_eq!(second.unchanged, 0);
}

#[test]
fn test_configured_tolerance_is_used() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    catalog(&session, &[1]);
    let service = IngestService::new(&IngestSettings::default().with_epoch_tolerance(60.0));

    service.run(&session, &batch(vec![elements(1, T0 - DAY)]), T0).unwrap();
    let report = service
        .run(&session, &batch(vec![elements(1, T0 - DAY + 45.0)]), T0 + DAY)
        .unwrap();
    assert_eq!(report.unchanged, 1);
}

#[test]
fn test_rerun_of_same_feeds_changes_nothing_but_the_epoch() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    catalog(&session, &[1, 2, 3]);
    let feed = batch(vec![elements(1, T0 - 100.0), elements(2, T0 - 200.0), elements(3, T0 - 300.0)]);

    let first = run(&session, &feed, T0);
    assert_eq!(first.inserted, 3);

    let second = run(&session, &feed, T0 + 3_600.0);
    assert_eq!(second.downloaded, 3);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.unchanged, 3);
    assert_eq!(second.duplicated, 3);

    let memberships = session.memberships_for_epoch(second.epoch_id.unwrap()).unwrap();
    assert_eq!(memberships.len(), 3);
    assert!(memberships.iter().all(|m| m.kind == MembershipKind::Unchanged));
}

#[test]
fn test_stale_republished_orbit_drops_out_of_new_epochs() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    catalog(&session, &[7]);
    let feed = batch(vec![elements(7, T0 - 21.0 * DAY)]);

    let first = run(&session, &feed, T0 - 20.0 * DAY);
    assert_eq!(first.inserted, 1);

    let stale = run(&session, &feed, T0 - DAY);
    assert_eq!(stale.unchanged, 1);
    assert_eq!(stale.duplicated, 0, "measured 19 days before this run");
    assert!(session.memberships_for_epoch(stale.epoch_id.unwrap()).unwrap().is_empty());

    let latest = run(&session, &feed, T0);
    assert_eq!(latest.unchanged, 1);
    assert_eq!(latest.duplicated, 0);
    assert!(session.memberships_for_epoch(latest.epoch_id.unwrap()).unwrap().is_empty());
}

#[test]
fn test_gap_fill_carries_recent_orbits_only() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    catalog(&session, &[10, 11]);

    // Object 10 observed 11 days ago, object 11 three days ago
    run(&session, &batch(vec![elements(10, T0 - 11.0 * DAY)]), T0 - 11.0 * DAY);
    let middle = run(&session, &batch(vec![elements(11, T0 - 3.0 * DAY)]), T0 - 3.0 * DAY);
    assert_eq!(middle.duplicated, 1, "object 10 is still fresh enough after 8 days");

    let latest = run(&session, &batch(Vec::new()), T0);
    assert_eq!(latest.duplicated, 1);

    let epoch_id = latest.epoch_id.unwrap();
    let memberships = session.memberships_for_epoch(epoch_id).unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].norad_id, NoradId::new(11));
    assert_eq!(memberships[0].kind, MembershipKind::Carried);
    assert!(session.get_membership(NoradId::new(10), epoch_id).unwrap().is_none());
}

#[test]
fn test_one_membership_per_object_and_epoch() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    catalog(&session, &[5]);

    let feeds = vec![
        FeedBatch::from_elements(None, vec![elements(5, T0 - 50.0)], 0),
        FeedBatch::from_elements(None, vec![elements(5, T0 - 10.0), elements(5, T0 - 20.0)], 0),
    ];
    let report = run(&session, &feeds, T0);

    assert_eq!(report.inserted, 1);
    let memberships = session.memberships_for_epoch(report.epoch_id.unwrap()).unwrap();
    assert_eq!(memberships.len(), 1);
    let orbit = session.get_orbit(memberships[0].orbit_id).unwrap().unwrap();
    assert_eq!(orbit.epoch, T0 - 50.0);
}

#[test]
fn test_elements_for_uncatalogued_objects_are_discarded() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    catalog(&session, &[1]);

    let report = run(&session, &batch(vec![elements(1, T0), elements(999, T0)]), T0);
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.inserted, 1);
    assert!(!session.object_exists(NoradId::new(999)).unwrap());
}

#[test]
fn test_cospar_collision_deletes_previous_holder() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    let reconciler = CatalogReconciler::default();

    reconciler.reconcile(&session, &[record(100, "X", "FIRST")]).unwrap();
    let summary = reconciler.reconcile(&session, &[record(200, "X", "SECOND")]).unwrap();

    assert_eq!(summary.collisions, 1);
    assert!(!session.object_exists(NoradId::new(100)).unwrap());
    let object = session.get_object(NoradId::new(200)).unwrap().unwrap();
    assert_eq!(object.cospar_id.as_deref(), Some("X"));
}

#[test]
fn test_debris_name_is_flagged_and_decomposed() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();

    CatalogReconciler::default()
        .reconcile(&session, &[record(44_238, "2019-029D", "STARLINK-30 (DEB)")])
        .unwrap();

    assert!(session.get_object(NoradId::new(44_238)).unwrap().unwrap().is_debris);
    let names = session.names_for(NoradId::new(44_238)).unwrap();
    let canonical: Vec<&str> = names
        .iter()
        .filter(|n| n.is_canonical)
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(canonical, vec!["STARLINK-30"]);
    assert!(names.iter().any(|n| n.name == "DEB" && !n.is_canonical));
}

#[test]
fn test_annex_names_replace_earlier_annex_names() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    let reconciler = CatalogReconciler::new(NameNormalizer::from_settings(&IngestSettings::default()));
    reconciler.reconcile(&session, &[record(25_544, "1998-067A", "ISS (ZARYA)")]).unwrap();

    let annex = |name: &str, is_canonical: bool| AnnexEntry {
        norad_id: NoradId::new(25_544),
        names: vec![AnnexName {
            name: name.to_string(),
            is_canonical,
        }],
    };
    reconciler.apply_annex(&session, &[annex("SPACE STATION", false)]).unwrap();
    reconciler.apply_annex(&session, &[annex("ISS", true)]).unwrap();

    let names = session.names_for(NoradId::new(25_544)).unwrap();
    assert!(!names.iter().any(|n| n.name == "SPACE STATION"));
    let canonical: Vec<(&str, NameSource)> = names
        .iter()
        .filter(|n| n.is_canonical)
        .map(|n| (n.name.as_str(), n.source))
        .collect();
    assert_eq!(canonical, vec![("ISS", NameSource::Annex)]);
}

#[test]
fn test_decoded_feed_runs_end_to_end() {
    let mut store = SqliteStore::in_memory().unwrap();
    let session = store.begin().unwrap();
    CatalogReconciler::default()
        .reconcile(&session, &[record(25_544, "1998-067A", "ISS (ZARYA)")])
        .unwrap();

    let magnitudes = MagnitudeTable::new();
    let overrides = HashMap::new();
    let context = DecodeContext {
        magnitudes: &magnitudes,
        magnitude_overrides: &overrides,
        subgroup: None,
        source: ElementSource::Celestrak,
    };
    let text = format!("{ISS}1 25544U broken record\n");
    let file = parse_elements(&text, &context);
    assert_eq!(file.records.len(), 1);
    assert_eq!(file.malformed, 1);

    let feeds = vec![FeedBatch::from_elements(None, file.records, file.malformed)];
    let report = run(&session, &feeds, T0);
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.malformed, 1);
}

#[test]
fn test_dropped_session_rolls_back_the_run() {
    let mut store = SqliteStore::in_memory().unwrap();
    {
        let session = store.begin().unwrap();
        catalog(&session, &[1]);
        session.commit().unwrap();
    }
    {
        let session = store.begin().unwrap();
        run(&session, &batch(vec![elements(1, T0)]), T0);
    }

    let session = store.begin().unwrap();
    assert!(session.recent_epochs(10).unwrap().is_empty());
    assert!(session.object_exists(NoradId::new(1)).unwrap());
}
