use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Remote key of one movie record.
pub type MovieId = u64;

/// Untyped response body exactly as the API returned it.
pub type RawRecord = Map<String, Value>;

/// One entry of the identifier source file: `{ "id": 550 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieIdEntry {
    pub id: MovieId,
}

/// Fixed-schema movie produced by the normalizer and written by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMovie {
    pub id: MovieId,
    pub original_language: String,
    pub original_title: String,
    pub title: String,
    pub poster_path: Option<String>,
    pub popularity: f64,
    pub runtime: i64,
    pub budget: i64,
    pub release_date: String,
    pub release_dates: Vec<Release>,
    pub genres: Vec<i64>,
    pub production_countries: Vec<Country>,
    pub actors: Vec<Actor>,
    pub directors: Vec<Director>,
}

/// Release dates for one country.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub iso_3166_1: String,
    pub local_release_dates: Vec<LocalReleaseDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalReleaseDate {
    pub note: String,
    pub release_date: String,
    #[serde(rename = "type")]
    pub release_type: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Director {
    pub id: i64,
    pub name: String,
}

/// Per-worker tally returned when a worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub processed: u64,
    pub normalized: u64,
    pub fetch_failed: u64,
    pub normalize_failed: u64,
    pub cancelled: u64,
}

impl WorkerReport {
    pub fn merge(&mut self, other: &WorkerReport) {
        self.processed += other.processed;
        self.normalized += other.normalized;
        self.fetch_failed += other.fetch_failed;
        self.normalize_failed += other.normalize_failed;
        self.cancelled += other.cancelled;
    }
}

/// Running totals owned by the aggregator and readable by reporters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    pub records_received: u64,
    pub records_written: u64,
    pub records_dropped: u64,
    pub batches_flushed: u64,
    pub batches_failed: u64,
}

/// What one harvest run did, end to end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub ids_enqueued: u64,
    pub ids_skipped: u64,
    pub workers: WorkerReport,
    pub aggregator: AggregatorStats,
}
