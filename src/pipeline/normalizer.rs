// src/pipeline/normalizer.rs

//! Maps a raw movie document onto [`NormalizedMovie`].
//!
//! Only the `id` field is required. Every other field falls back to its
//! zero value, and every nested section is normalized on its own so one bad
//! entry never costs the whole record.

use serde_json::Value;
use tracing::trace;

use crate::data_model::{
    Actor, Country, Director, LocalReleaseDate, NormalizedMovie, RawRecord, Release,
};
use crate::error::{PipelineError, Result};
use crate::utils::json::{
    get_array, get_f64, get_i64, get_object, get_str, get_u64, i64_or_zero, str_or_empty, Object,
};

/// Cast entries with a billing order at or above this are dropped.
pub const MAX_ACTOR_ORDER: i64 = 5;
/// Crew job that qualifies an entry as a director. Compared case-sensitively.
pub const DIRECTOR_JOB: &str = "Director";

pub fn normalize(raw: &RawRecord) -> Result<NormalizedMovie> {
    let id = get_u64(raw, "id").ok_or_else(|| {
        PipelineError::NormalizeSchemaError(match raw.get("id") {
            None => "missing 'id'".to_string(),
            Some(other) => format!("'id' is not a non-negative integer: {}", other),
        })
    })?;

    let (actors, directors) = match get_object(raw, "credits") {
        Some(credits) => (parse_actors(credits), parse_directors(credits)),
        None => (Vec::new(), Vec::new()),
    };

    Ok(NormalizedMovie {
        id,
        original_language: str_or_empty(raw, "original_language"),
        original_title: str_or_empty(raw, "original_title"),
        title: str_or_empty(raw, "title"),
        poster_path: get_str(raw, "poster_path")
            .filter(|path| !path.is_empty())
            .map(str::to_string),
        popularity: get_f64(raw, "popularity").unwrap_or(0.0),
        runtime: i64_or_zero(raw, "runtime"),
        budget: i64_or_zero(raw, "budget"),
        release_date: str_or_empty(raw, "release_date"),
        release_dates: get_object(raw, "release_dates")
            .map(parse_release_dates)
            .unwrap_or_default(),
        genres: get_array(raw, "genres")
            .map(|genres| parse_genres(genres))
            .unwrap_or_default(),
        production_countries: get_array(raw, "production_countries")
            .map(|countries| parse_production_countries(countries))
            .unwrap_or_default(),
        actors,
        directors,
    })
}

/// `release_dates.results[]` holds one group per country; each group has its
/// own `release_dates[]` list.
fn parse_release_dates(section: &Object) -> Vec<Release> {
    let Some(groups) = get_array(section, "results") else {
        return Vec::new();
    };

    groups
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|group| {
            let Some(entries) = get_array(group, "release_dates") else {
                trace!(group = ?group.get("iso_3166_1"), "Skipping release group without a date list");
                return None;
            };
            Some(Release {
                iso_3166_1: str_or_empty(group, "iso_3166_1"),
                local_release_dates: entries
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(parse_local_release_date)
                    .collect(),
            })
        })
        .collect()
}

/// An entry without a string `release_date` is malformed and skipped.
fn parse_local_release_date(entry: &Object) -> Option<LocalReleaseDate> {
    let release_date = get_str(entry, "release_date")?;
    Some(LocalReleaseDate {
        note: str_or_empty(entry, "note"),
        release_date: release_date.to_string(),
        release_type: i64_or_zero(entry, "type"),
    })
}

fn parse_genres(genres: &[Value]) -> Vec<i64> {
    genres
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|genre| get_i64(genre, "id"))
        .collect()
}

fn parse_production_countries(countries: &[Value]) -> Vec<Country> {
    countries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|country| {
            Some(Country {
                iso_3166_1: get_str(country, "iso_3166_1")?.to_string(),
                name: str_or_empty(country, "name"),
            })
        })
        .collect()
}

/// Keeps cast entries whose `order` is in `0..MAX_ACTOR_ORDER`, in source order.
/// The filter is on the value, so sparse or repeated orders yield fewer or more
/// than five distinct ranks.
fn parse_actors(credits: &Object) -> Vec<Actor> {
    let Some(cast) = get_array(credits, "cast") else {
        return Vec::new();
    };

    cast.iter()
        .filter_map(Value::as_object)
        .filter_map(|member| {
            let order = get_i64(member, "order")?;
            (0..MAX_ACTOR_ORDER).contains(&order).then(|| Actor {
                id: i64_or_zero(member, "id"),
                name: str_or_empty(member, "name"),
                order,
            })
        })
        .collect()
}

fn parse_directors(credits: &Object) -> Vec<Director> {
    let Some(crew) = get_array(credits, "crew") else {
        return Vec::new();
    };

    crew.iter()
        .filter_map(Value::as_object)
        .filter(|member| get_str(member, "job") == Some(DIRECTOR_JOB))
        .map(|member| Director {
            id: i64_or_zero(member, "id"),
            name: str_or_empty(member, "name"),
        })
        .collect()
}
