//! Feed acquisition.
//!
//! Turns the configured feeds into parsed data: magnitude tables, the
//! catalog and its annex, and one [`FeedBatch`] per element feed. All
//! network traffic of a run happens here, before the catalog transaction
//! is opened.

use std::collections::HashMap;
use std::path::Path;

use crate::config::{FetchSettings, SatlogConfig};
use crate::feeds::{
    AnnexEntry, DecodeContext, MagnitudeTable, SatcatFile, parse_annex, parse_elements,
    parse_satcat,
};
use crate::fetch::{CachedFetcher, FetchMethod, FetchOutcome, FetchSpec, Transport};
use crate::models::{ElementSource, Subgroup, SubgroupFeed};
use crate::services::FeedBatch;
use crate::{Error, Result};

const MCNAMES: &str = "mcnames";
const QSMAG: &str = "qs.mag";
const SATCAT: &str = "satcat.txt";
const ANNEX: &str = "satcat-annex.txt";
const SPACETRACK: &str = "spacetrack.tle";

/// Retrieves and parses every feed of a run.
pub struct FeedAcquisition<T: Transport> {
    fetcher: CachedFetcher<T>,
    settings: FetchSettings,
    magnitude_overrides: HashMap<String, f64>,
}

impl<T: Transport> FeedAcquisition<T> {
    /// Creates an acquisition over `transport` using the feed settings of `config`.
    #[must_use]
    pub fn new(config: &SatlogConfig, transport: T) -> Self {
        Self {
            fetcher: CachedFetcher::new(transport, config.fetch.cache_dir.clone()),
            settings: config.fetch.clone(),
            magnitude_overrides: config.ingest.magnitude_overrides.clone(),
        }
    }

    /// Returns the underlying fetcher.
    #[must_use]
    pub const fn fetcher(&self) -> &CachedFetcher<T> {
        &self.fetcher
    }

    fn spec(&self, name: &str, url: String) -> FetchSpec {
        FetchSpec::get(name, url).with_fallback(self.settings.fallback_for(name))
    }

    fn fetch_text(&self, spec: &FetchSpec) -> Result<String> {
        let outcome = self.fetcher.fetch(spec)?;
        if let FetchOutcome::Stale(path) = &outcome {
            tracing::warn!(feed = %spec.name, path = %path.display(), "Using stale copy of feed");
        }
        outcome.read_to_string()
    }

    /// Loads both magnitude tables.
    ///
    /// A table that cannot be retrieved is logged and left out.
    #[must_use]
    pub fn magnitudes(&self) -> MagnitudeTable {
        let mut table = MagnitudeTable::new();
        let ttl = self.settings.magnitude_ttl();

        let mcnames = self.spec(MCNAMES, self.settings.mcnames_url.clone()).with_ttl(ttl);
        match self.fetch_text(&mcnames) {
            Ok(text) => {
                let loaded = table.load_mcnames(&text);
                tracing::debug!(loaded, "Loaded mcnames magnitudes");
            },
            Err(err) => tracing::warn!(error = %err, "No mcnames magnitude table available"),
        }

        // qs.mag is loaded second so its values win
        let qsmag = self.spec(QSMAG, self.settings.qsmag_url.clone()).with_ttl(ttl);
        match self.fetch_text(&qsmag) {
            Ok(text) => {
                let loaded = table.load_qsmag(&text);
                tracing::debug!(loaded, "Loaded qs.mag magnitudes");
            },
            Err(err) => tracing::warn!(error = %err, "No qs.mag magnitude table available"),
        }

        tracing::info!(objects = table.len(), "Magnitude table ready");
        table
    }

    /// Retrieves and parses the master catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if no copy of the catalog is available.
    pub fn catalog(&self) -> Result<SatcatFile> {
        let spec = self
            .spec(SATCAT, self.settings.satcat_url.clone())
            .with_ttl(self.settings.catalog_ttl())
            .with_min_lines(self.settings.min_lines);
        let catalog = parse_satcat(&self.fetch_text(&spec)?);
        tracing::info!(
            records = catalog.records.len(),
            malformed = catalog.malformed,
            "Catalog parsed"
        );
        Ok(catalog)
    }

    /// Retrieves the annex, preceded by the local extra-names file.
    ///
    /// Returns `Ok(None)` when the downloaded annex is unavailable, in which
    /// case stored annex names should be left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the extra-names file exists but cannot be read.
    pub fn annex(&self, extra_names: Option<&Path>) -> Result<Option<Vec<AnnexEntry>>> {
        let spec = self
            .spec(ANNEX, self.settings.annex_url.clone())
            .with_ttl(self.settings.catalog_ttl());
        let annex = match self.fetch_text(&spec) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "Catalog annex unavailable, keeping stored annex names");
                return Ok(None);
            },
        };

        let mut entries = Vec::new();
        if let Some(path) = extra_names.filter(|path| path.exists()) {
            let text = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
                operation: "read_extra_names".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;
            entries.extend(parse_annex(&text));
        }
        entries.extend(parse_annex(&annex));
        Ok(Some(entries))
    }

    /// Builds one batch per subgroup, plus the bulk feed when enabled.
    ///
    /// Element feeds that cannot be retrieved are logged and skipped.
    #[must_use]
    pub fn element_batches(&self, subgroups: &[Subgroup], magnitudes: &MagnitudeTable) -> Vec<FeedBatch> {
        let mut batches = Vec::with_capacity(subgroups.len() + 1);

        for subgroup in subgroups {
            match &subgroup.feed {
                SubgroupFeed::Members(members) => {
                    batches.push(FeedBatch::from_members(subgroup.clone(), members));
                },
                SubgroupFeed::File(file_name) => {
                    let spec = self
                        .spec(file_name, self.settings.element_url(file_name))
                        .with_ttl(self.settings.element_ttl())
                        .with_min_lines(self.settings.min_lines);
                    let context = DecodeContext {
                        magnitudes,
                        magnitude_overrides: &self.magnitude_overrides,
                        subgroup: Some(subgroup.name.as_str()),
                        source: ElementSource::Celestrak,
                    };
                    match self.fetch_text(&spec) {
                        Ok(text) => {
                            let file = parse_elements(&text, &context);
                            tracing::debug!(
                                subgroup = %subgroup.name,
                                records = file.records.len(),
                                "Element feed decoded"
                            );
                            batches.push(FeedBatch::from_elements(
                                Some(subgroup.clone()),
                                file.records,
                                file.malformed,
                            ));
                        },
                        Err(err) => {
                            tracing::warn!(subgroup = %subgroup.name, error = %err, "Skipping element feed");
                        },
                    }
                },
            }
        }

        if let Some(batch) = self.spacetrack_batch(magnitudes) {
            batches.push(batch);
        }
        batches
    }

    fn spacetrack_batch(&self, magnitudes: &MagnitudeTable) -> Option<FeedBatch> {
        let spacetrack = &self.settings.spacetrack;
        let Some((identity, password)) = spacetrack.credentials() else {
            if spacetrack.enabled {
                tracing::warn!("Bulk element feed enabled without credentials, skipping");
            }
            return None;
        };

        let spec = self
            .spec(SPACETRACK, spacetrack.login_url.clone())
            .with_method(FetchMethod::LoginQuery {
                identity: identity.to_string(),
                password: password.clone(),
                query: spacetrack.query.clone(),
            })
            .with_ttl(spacetrack.ttl())
            .with_min_lines(self.settings.min_lines);

        let text = match self.fetch_text(&spec) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping bulk element feed");
                return None;
            },
        };

        let context = DecodeContext {
            magnitudes,
            magnitude_overrides: &self.magnitude_overrides,
            subgroup: None,
            source: ElementSource::SpaceTrack,
        };
        let file = parse_elements(&text, &context);
        tracing::info!(records = file.records.len(), "Bulk element feed decoded");
        Some(FeedBatch::from_elements(None, file.records, file.malformed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoradId, SubgroupId};
    use std::cell::RefCell;

    const ISS: &str = "ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537
";

    /// Serves fixed bodies by URL and records every request.
    struct FixtureTransport {
        bodies: HashMap<String, String>,
        requests: RefCell<Vec<(String, bool)>>,
    }

    impl FixtureTransport {
        fn new(bodies: &[(&str, &str)]) -> Self {
            Self {
                bodies: bodies
                    .iter()
                    .map(|(url, body)| ((*url).to_string(), (*body).to_string()))
                    .collect(),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for FixtureTransport {
        fn fetch(&self, url: &str, method: &FetchMethod) -> Result<String> {
            let authenticated = matches!(method, FetchMethod::LoginQuery { .. });
            self.requests.borrow_mut().push((url.to_string(), authenticated));
            self.bodies.get(url).cloned().ok_or_else(|| Error::Fetch {
                url: url.to_string(),
                cause: "HTTP 404 Not Found".to_string(),
            })
        }
    }

    fn config(dir: &Path) -> SatlogConfig {
        let mut config = SatlogConfig::default().with_data_dir(dir);
        config.fetch.element_base_url = "https://feeds.test/elements".to_string();
        config.fetch.satcat_url = "https://feeds.test/satcat.txt".to_string();
        config.fetch.annex_url = "https://feeds.test/annex.txt".to_string();
        config
    }

    fn subgroup(id: i64, name: &str, feed: SubgroupFeed) -> Subgroup {
        Subgroup {
            id: SubgroupId::new(id),
            group: "Special-Interest".to_string(),
            name: name.to_string(),
            feed,
        }
    }

    #[test]
    fn test_element_batches_decode_files_and_members() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config
            .ingest
            .magnitude_overrides
            .insert("Stations".to_string(), 4.0);
        let acquisition = FeedAcquisition::new(
            &config,
            FixtureTransport::new(&[("https://feeds.test/elements/stations.txt", ISS)]),
        );

        let subgroups = vec![
            subgroup(1, "Stations", SubgroupFeed::File("stations.txt".to_string())),
            subgroup(2, "Missing", SubgroupFeed::File("gone.txt".to_string())),
            subgroup(3, "Brightest", SubgroupFeed::Members(vec![NoradId::new(25_544)])),
        ];
        let batches = acquisition.element_batches(&subgroups, &MagnitudeTable::new());

        assert_eq!(batches.len(), 2);
        let stations = &batches[0];
        assert_eq!(stations.entries.len(), 1);
        let elements = stations.entries[0].elements.as_ref().unwrap();
        assert_eq!(elements.norad_id, NoradId::new(25_544));
        assert_eq!(elements.state.magnitude, Some(4.0));
        assert!(batches[1].entries[0].elements.is_none());
    }

    #[test]
    fn test_spacetrack_requires_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.fetch.spacetrack.enabled = true;
        config.fetch.spacetrack.login_url = "https://bulk.test/login".to_string();
        let acquisition = FeedAcquisition::new(
            &config,
            FixtureTransport::new(&[("https://bulk.test/login", ISS)]),
        );
        assert!(acquisition.element_batches(&[], &MagnitudeTable::new()).is_empty());

        config.fetch.spacetrack.identity = Some("observer@example.org".to_string());
        config.fetch.spacetrack.password = Some(secrecy::SecretString::from("pw".to_string()));
        let acquisition = FeedAcquisition::new(
            &config,
            FixtureTransport::new(&[("https://bulk.test/login", ISS)]),
        );
        let batches = acquisition.element_batches(&[], &MagnitudeTable::new());
        assert_eq!(batches.len(), 1);
        let elements = batches[0].entries[0].elements.as_ref().unwrap();
        assert_eq!(elements.state.source, ElementSource::SpaceTrack);
        assert_eq!(
            acquisition.fetcher().transport().requests.borrow().as_slice(),
            &[("https://bulk.test/login".to_string(), true)]
        );
    }

    #[test]
    fn test_annex_is_skipped_when_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = FeedAcquisition::new(&config(dir.path()), FixtureTransport::new(&[]));
        assert_eq!(acquisition.annex(None).unwrap(), None);
    }

    #[test]
    fn test_annex_puts_extra_names_first() {
        let dir = tempfile::tempdir().unwrap();
        let extra = dir.path().join("extra-names.txt");
        std::fs::write(&extra, "25544|*International Space Station\n").unwrap();
        let acquisition = FeedAcquisition::new(
            &config(dir.path()),
            FixtureTransport::new(&[("https://feeds.test/annex.txt", "25544|ZARYA\n")]),
        );

        let entries = acquisition.annex(Some(&extra)).unwrap().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].names[0].name, "International Space Station");
        assert_eq!(entries[1].names[0].name, "ZARYA");
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = FeedAcquisition::new(&config(dir.path()), FixtureTransport::new(&[]));
        assert!(matches!(acquisition.catalog(), Err(Error::Fetch { .. })));
    }
}
