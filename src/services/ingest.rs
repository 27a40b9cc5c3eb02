//! Element ingestion runs.
//!
//! One run is one capture epoch. Everything the run writes goes through the
//! session it is given, so committing or dropping that session decides
//! whether the run is kept as a whole.

use uuid::Uuid;

use crate::config::IngestSettings;
use crate::feeds::DecodedElements;
use crate::models::{IngestReport, NoradId, Subgroup, SubgroupCount};
use crate::services::{GapFiller, MergeOutcome, OrbitMerger};
use crate::storage::CatalogSession;
use crate::Result;

/// One object listed by a feed, with its elements when the feed carries them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    /// Listed object.
    pub norad_id: NoradId,
    /// Decoded elements; `None` for member-list subgroups.
    pub elements: Option<DecodedElements>,
}

impl From<DecodedElements> for FeedEntry {
    fn from(elements: DecodedElements) -> Self {
        Self {
            norad_id: elements.norad_id,
            elements: Some(elements),
        }
    }
}

/// Entries of one feed, optionally belonging to a subgroup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedBatch {
    /// Subgroup the listed objects become members of.
    pub subgroup: Option<Subgroup>,
    /// Listed objects.
    pub entries: Vec<FeedEntry>,
    /// Records of the feed that could not be decoded.
    pub malformed: u64,
}

impl FeedBatch {
    /// Creates a batch of decoded element records.
    #[must_use]
    pub fn from_elements(subgroup: Option<Subgroup>, records: Vec<DecodedElements>, malformed: u64) -> Self {
        Self {
            subgroup,
            entries: records.into_iter().map(FeedEntry::from).collect(),
            malformed,
        }
    }

    /// Creates a batch for a subgroup that lists members without elements.
    #[must_use]
    pub fn from_members(subgroup: Subgroup, members: &[NoradId]) -> Self {
        Self {
            subgroup: Some(subgroup),
            entries: members
                .iter()
                .map(|&norad_id| FeedEntry {
                    norad_id,
                    elements: None,
                })
                .collect(),
            malformed: 0,
        }
    }
}

/// Counter totals of the merge step, before gap-filling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MergeTotals {
    downloaded: u64,
    inserted: u64,
    unchanged: u64,
}

impl MergeTotals {
    fn record(&mut self, outcome: MergeOutcome) {
        if outcome.is_download() {
            self.downloaded += 1;
        }
        match outcome {
            MergeOutcome::Inserted(_) => self.inserted += 1,
            MergeOutcome::Unchanged(_) => self.unchanged += 1,
            MergeOutcome::UnknownObject | MergeOutcome::AlreadyRecorded => {},
        }
    }
}

/// Service running one element ingestion.
#[derive(Debug, Clone, Copy)]
pub struct IngestService {
    merger: OrbitMerger,
    gap_filler: GapFiller,
}

impl Default for IngestService {
    fn default() -> Self {
        Self::new(&IngestSettings::default())
    }
}

impl IngestService {
    /// Creates an ingest service.
    #[must_use]
    pub fn new(settings: &IngestSettings) -> Self {
        Self {
            merger: OrbitMerger::from_settings(settings),
            gap_filler: GapFiller::from_settings(settings),
        }
    }

    /// Runs one ingestion as a new capture epoch at `timestamp`.
    ///
    /// Creates the capture epoch, rebuilds group membership from the
    /// batches, merges every element set, gap-fills the epoch and reports
    /// the counters. Objects missing from the catalog are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails. The session should
    /// then be dropped so the run is rolled back.
    pub fn run<S>(&self, session: &S, batches: &[FeedBatch], timestamp: f64) -> Result<IngestReport>
    where
        S: CatalogSession + ?Sized,
    {
        let run_id = Uuid::now_v7().to_string();
        let span = tracing::info_span!("ingest", run_id = %run_id);
        let _enter = span.enter();

        let epoch = session.insert_epoch(timestamp, &run_id)?;
        tracing::info!(epoch_id = %epoch.id, timestamp, "Created capture epoch");

        let cleared = session.clear_group_members()?;
        tracing::debug!(cleared, "Cleared group membership");

        let mut totals = MergeTotals::default();
        for batch in batches {
            for entry in &batch.entries {
                if !session.object_exists(entry.norad_id)? {
                    tracing::debug!(norad_id = %entry.norad_id, "Skipping uncatalogued object");
                    continue;
                }
                if let Some(elements) = &entry.elements {
                    totals.record(self.merger.merge(session, &epoch, elements)?);
                }
                if let Some(subgroup) = &batch.subgroup {
                    session.add_group_member(entry.norad_id, subgroup.id)?;
                }
            }
        }

        let duplicated = self.gap_filler.fill(session, &epoch)?;

        // Subgroups whose feed failed or listed nothing still report zero
        let subgroups = session.list_subgroups()?;
        let mut counts = Vec::with_capacity(subgroups.len());
        for subgroup in subgroups {
            counts.push(SubgroupCount {
                objects: session.count_group_members(subgroup.id)?,
                group: subgroup.group,
                subgroup: subgroup.name,
            });
        }

        let report = IngestReport {
            run_id,
            epoch_id: Some(epoch.id),
            epoch_timestamp: epoch.timestamp,
            downloaded: totals.downloaded,
            inserted: totals.inserted,
            unchanged: totals.unchanged,
            duplicated,
            malformed: batches.iter().map(|batch| batch.malformed).sum(),
            subgroups: counts,
        };

        tracing::info!(
            downloaded = report.downloaded,
            inserted = report.inserted,
            unchanged = report.unchanged,
            duplicated = report.duplicated,
            malformed = report.malformed,
            "Ingestion complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ElementSource, OrbitalState, SubgroupFeed, SubgroupId};
    use crate::storage::SqliteStore;

    fn elements(norad: u32, epoch: f64) -> DecodedElements {
        DecodedElements {
            norad_id: NoradId::new(norad),
            state: OrbitalState {
                norad_id: NoradId::new(norad),
                epoch,
                inclination: 51.64,
                eccentricity: 0.0004,
                raan: 200.0,
                arg_periapsis: 60.0,
                mean_anomaly: 300.0,
                mean_motion: 15.5,
                mean_motion_dot: 0.0,
                mean_motion_ddot: 0.0,
                bstar: 0.0,
                magnitude: None,
                source: ElementSource::Celestrak,
                rev_count: 4,
            },
        }
    }

    fn subgroup(session: &impl CatalogSession, name: &str, feed: SubgroupFeed) -> Subgroup {
        let group_id = session.ensure_group("Special-Interest").unwrap();
        let id: SubgroupId = session.upsert_subgroup(group_id, name, &feed).unwrap();
        Subgroup {
            id,
            group: "Special-Interest".to_string(),
            name: name.to_string(),
            feed,
        }
    }

    #[test]
    fn test_run_counts_and_group_membership() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        for norad in [1, 2, 3] {
            session.insert_object_stub(NoradId::new(norad)).unwrap();
        }
        let stations = subgroup(&session, "Stations", SubgroupFeed::File("stations.txt".to_string()));
        let brightest = subgroup(
            &session,
            "Brightest",
            SubgroupFeed::Members(vec![NoradId::new(1), NoradId::new(3), NoradId::new(404)]),
        );

        let batches = vec![
            FeedBatch::from_elements(
                Some(stations.clone()),
                vec![elements(1, 1_000.0), elements(2, 2_000.0), elements(404, 3_000.0)],
                1,
            ),
            FeedBatch::from_members(brightest, &[NoradId::new(1), NoradId::new(3), NoradId::new(404)]),
            FeedBatch::from_elements(None, vec![elements(1, 1_000.5)], 0),
        ];

        let report = IngestService::default().run(&session, &batches, 10_000.0).unwrap();

        // The re-listed object 1 counts as downloaded but adds nothing
        assert_eq!(report.downloaded, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.unchanged, 0);
        assert_eq!(report.duplicated, 0);
        assert_eq!(report.malformed, 1);
        let counts: Vec<(&str, u64)> = report
            .subgroups
            .iter()
            .map(|c| (c.subgroup.as_str(), c.objects))
            .collect();
        assert_eq!(counts, vec![("Brightest", 2), ("Stations", 2)]);
        assert!(!report.run_id.is_empty());
        assert_eq!(session.count_group_members(stations.id).unwrap(), 2);
    }

    #[test]
    fn test_group_membership_is_rebuilt_each_run() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        session.insert_object_stub(NoradId::new(1)).unwrap();
        session.insert_object_stub(NoradId::new(2)).unwrap();
        let stations = subgroup(&session, "Stations", SubgroupFeed::File("stations.txt".to_string()));
        let service = IngestService::default();

        service
            .run(
                &session,
                &[FeedBatch::from_elements(
                    Some(stations.clone()),
                    vec![elements(1, 1_000.0), elements(2, 1_000.0)],
                    0,
                )],
                10_000.0,
            )
            .unwrap();
        service
            .run(
                &session,
                &[FeedBatch::from_elements(Some(stations.clone()), vec![elements(2, 1_000.0)], 0)],
                20_000.0,
            )
            .unwrap();

        assert_eq!(session.count_group_members(stations.id).unwrap(), 1);
    }

    #[test]
    fn test_subgroup_without_batch_counts_zero() {
        let mut store = SqliteStore::in_memory().unwrap();
        let session = store.begin().unwrap();
        session.insert_object_stub(NoradId::new(1)).unwrap();
        let stations = subgroup(&session, "Stations", SubgroupFeed::File("stations.txt".to_string()));
        subgroup(&session, "Weather", SubgroupFeed::File("weather.txt".to_string()));

        let batches = vec![FeedBatch::from_elements(Some(stations), vec![elements(1, 1_000.0)], 0)];
        let report = IngestService::default().run(&session, &batches, 10_000.0).unwrap();

        let counts: Vec<(&str, u64)> = report
            .subgroups
            .iter()
            .map(|c| (c.subgroup.as_str(), c.objects))
            .collect();
        assert_eq!(counts, vec![("Stations", 1), ("Weather", 0)]);
    }
}
