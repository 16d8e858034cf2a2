// Shared test doubles for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use movie_harvester::data_model::{MovieId, NormalizedMovie, RawRecord};
use movie_harvester::error::{PipelineError, Result};
use movie_harvester::pipeline::writers::BaseWriter;
use movie_harvester::pipeline::RecordFetcher;

pub fn raw(value: Value) -> RawRecord {
    value.as_object().cloned().expect("test document must be an object")
}

/// A trimmed-down but realistic movie details response.
pub fn sample_movie_json(id: MovieId) -> Value {
    json!({
        "id": id,
        "original_language": "en",
        "original_title": "Fight Club",
        "title": "Fight Club",
        "poster_path": "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
        "popularity": 73.433,
        "runtime": 139,
        "budget": 63000000,
        "release_date": "1999-10-15",
        "genres": [{ "id": 18, "name": "Drama" }, { "id": 53, "name": "Thriller" }],
        "production_countries": [
            { "iso_3166_1": "DE", "name": "Germany" },
            { "iso_3166_1": "US", "name": "United States of America" }
        ],
        "release_dates": {
            "results": [
                {
                    "iso_3166_1": "US",
                    "release_dates": [
                        { "certification": "R", "note": "", "release_date": "1999-10-15T00:00:00.000Z", "type": 3 },
                        { "certification": "R", "note": "DVD", "release_date": "2000-06-06T00:00:00.000Z", "type": 5 }
                    ]
                },
                {
                    "iso_3166_1": "DE",
                    "release_dates": [
                        { "note": "", "release_date": "1999-11-11T00:00:00.000Z", "type": 3 }
                    ]
                }
            ]
        },
        "credits": {
            "cast": [
                { "id": 819, "name": "Edward Norton", "order": 0 },
                { "id": 287, "name": "Brad Pitt", "order": 1 },
                { "id": 1283, "name": "Helena Bonham Carter", "order": 2 },
                { "id": 7470, "name": "Meat Loaf", "order": 3 },
                { "id": 7499, "name": "Jared Leto", "order": 4 },
                { "id": 7471, "name": "Zach Grenier", "order": 5 }
            ],
            "crew": [
                { "id": 7467, "name": "David Fincher", "job": "Director" },
                { "id": 7474, "name": "Ross Grayson Bell", "job": "Producer" }
            ]
        }
    })
}

pub fn sample_movie(id: MovieId) -> NormalizedMovie {
    NormalizedMovie {
        id,
        title: format!("Movie {}", id),
        ..Default::default()
    }
}

/// Records every batch it is asked to write.
#[derive(Clone, Default)]
pub struct MemoryWriter {
    pub batches: Arc<Mutex<Vec<Vec<NormalizedMovie>>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl MemoryWriter {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn all_ids(&self) -> Vec<MovieId> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|movie| movie.id)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

impl BaseWriter for MemoryWriter {
    fn write_batch(&mut self, records: &[NormalizedMovie]) -> Result<()> {
        self.batches.lock().unwrap().push(records.to_vec());
        Ok(())
    }

    fn close(self) -> Result<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// Fails the first `fail_first` writes, then behaves like [`MemoryWriter`].
#[derive(Clone, Default)]
pub struct FlakyWriter {
    pub inner: MemoryWriter,
    pub fail_first: usize,
    pub attempts: Arc<AtomicUsize>,
}

impl FlakyWriter {
    pub fn always_failing() -> Self {
        FlakyWriter {
            fail_first: usize::MAX,
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl BaseWriter for FlakyWriter {
    fn write_batch(&mut self, records: &[NormalizedMovie]) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            return Err(PipelineError::WriteError {
                path: "memory".to_string(),
                reason: "disk full".to_string(),
            });
        }
        self.inner.write_batch(records)
    }

    fn close(self) -> Result<()> {
        self.inner.close()
    }
}

pub enum Canned {
    Status(u16),
    Transport,
    Body(Value),
}

/// Serves `sample_movie_json(id)` for every identifier unless a canned
/// response is registered for it.
#[derive(Default)]
pub struct StaticFetcher {
    pub canned: HashMap<MovieId, Canned>,
    pub calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn with(mut self, id: MovieId, response: Canned) -> Self {
        self.canned.insert(id, response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordFetcher for StaticFetcher {
    async fn fetch(&self, id: MovieId) -> Result<RawRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.canned.get(&id) {
            Some(Canned::Status(code)) => Err(PipelineError::FetchStatusError { id, code: *code }),
            Some(Canned::Transport) => Err(PipelineError::FetchTransportError {
                id,
                reason: "connection reset".to_string(),
            }),
            Some(Canned::Body(body)) => Ok(raw(body.clone())),
            None => Ok(raw(sample_movie_json(id))),
        }
    }
}
