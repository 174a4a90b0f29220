//! Assembled tree types
//!
//! These are the shapes the traversal writes into and the output sink
//! serializes. Everything here is created during the crawl and never mutated
//! after its owning fetch returns; the whole tree is immutable once the root
//! future resolves.
//!
//! Descriptive fields the API sends alongside the structural ones (season
//! and league names, locations, flags) are carried opaquely in `extra` maps
//! rather than being modeled field by field. `serde_json::Map` keeps its
//! keys sorted, so two crawls of the same data serialize byte-identically.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::interval::TimeInterval;

/// A competition season: the top level of the assembled tree
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// Leagues in API index order; a slot is `None` when the league's
    /// events fetch failed and the null policy is in effect
    pub leagues: Vec<Option<League>>,

    /// Descriptive fields from the season index, carried through opaquely
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A league within a season
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct League {
    /// League identifier from the season index
    pub id: u64,

    /// Events in API listing order; empty when the events fetch failed and
    /// the placeholder policy is in effect
    pub events: Vec<Event>,

    /// Descriptive fields from the season index, carried through opaquely
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A competition event within a league
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier, extracted once from the event's resource URL
    pub id: String,

    /// Event time interval, with the declared timezone applied
    pub time: TimeInterval,

    /// Metadata blob from the event detail fetch; absent if that fetch
    /// failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    /// Per-category results in API listing order; empty if the detail
    /// fetch failed
    #[serde(default)]
    pub results: Vec<CategoryResult>,

    /// Descriptive fields from the league listing, carried through opaquely
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Results for one category of an event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    /// Category name (e.g. "Boulder Men")
    pub name: String,

    /// Discipline label (e.g. "boulder")
    pub discipline: String,

    /// Category label (e.g. "men")
    pub category: String,

    /// Ranking entries as the API sent them; an empty sequence is the
    /// failure marker for this category
    pub rankings: Vec<Value>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event() -> Event {
        Event {
            id: "1291".into(),
            time: TimeInterval::from_local("2024-04-08", "2024-04-10", None).unwrap(),
            meta: None,
            results: Vec::new(),
            extra: Map::new(),
        }
    }

    #[test]
    fn failed_league_slot_serializes_as_null() {
        let season = Season {
            leagues: vec![None],
            extra: Map::new(),
        };
        let json = serde_json::to_value(&season).unwrap();
        assert_eq!(json["leagues"], json!([null]));
    }

    #[test]
    fn absent_meta_is_omitted_from_the_document() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert!(
            json.get("meta").is_none(),
            "meta must be absent, not null: {json}"
        );
        assert_eq!(json["results"], json!([]));
    }

    #[test]
    fn extra_fields_are_flattened_alongside_structural_ones() {
        let mut extra = Map::new();
        extra.insert("name".into(), json!("World Cup Keqiao 2024"));
        extra.insert("location".into(), json!("Keqiao"));

        let mut event = sample_event();
        event.extra = extra;

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], "1291");
        assert_eq!(json["name"], "World Cup Keqiao 2024");
        assert_eq!(json["location"], "Keqiao");
    }

    #[test]
    fn serialization_is_deterministic_across_insertion_orders() {
        let mut forwards = Map::new();
        forwards.insert("a".into(), json!(1));
        forwards.insert("b".into(), json!(2));
        let mut backwards = Map::new();
        backwards.insert("b".into(), json!(2));
        backwards.insert("a".into(), json!(1));

        let mut one = sample_event();
        one.extra = forwards;
        let mut two = sample_event();
        two.extra = backwards;

        let one = serde_json::to_vec_pretty(&one).unwrap();
        let two = serde_json::to_vec_pretty(&two).unwrap();
        assert_eq!(one, two, "extra map must serialize in sorted key order");
    }

    #[test]
    fn event_round_trips_through_json() {
        let mut event = sample_event();
        event.meta = Some(json!({"title": "Test"}));
        event.results.push(CategoryResult {
            name: "Boulder Men".into(),
            discipline: "boulder".into(),
            category: "men".into(),
            rankings: vec![json!({"rank": 1})],
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
