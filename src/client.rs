//! Resource fetcher for the results API
//!
//! One thin operation per resource kind: season index, league events, event
//! detail, category full results. Each constructs the request, submits the
//! HTTP call (send + body read + JSON decode) as a single task to the
//! bounded queue, and parses the body into the data-model shape.
//!
//! Failure containment lives at this boundary. Transport and shape failures
//! in descendant fetches are logged and converted into the failure marker
//! for that resource kind — a `None` league, an event without meta, an
//! empty rankings sequence — and never propagate to sibling branches. The
//! season index fetch is the one deliberate exception: its failure aborts
//! the crawl.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{Error, Result, ShapeError};
use crate::interval::TimeInterval;
use crate::queue::BoundedQueue;
use crate::types::Event;

/// Path of the single results endpoint, addressed by query parameters
const RESULTS_API_PATH: &str = "results-api.php";

/// Event ids live in the event's canonical resource URL
static EVENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    // The pattern is a string literal; construction cannot fail.
    Regex::new(r"api/v1/events/(\d+)").unwrap_or_else(|e| panic!("event id pattern: {e}"))
});

/// HTTP client for the results API, admitting every call through the queue
#[derive(Clone, Debug)]
pub(crate) struct ResultsClient {
    http: reqwest::Client,
    endpoint: Url,
    queue: BoundedQueue,
}

// ---------------------------------------------------------------------------
// Wire shapes (adapter concern: field names as the remote API sends them)
// ---------------------------------------------------------------------------

/// One season as listed by `api=index`
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SeasonListing {
    pub(crate) leagues: Vec<LeagueListing>,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

/// One league as listed inside a season
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct LeagueListing {
    pub(crate) id: u64,
    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SeasonIndex {
    seasons: Vec<SeasonListing>,
}

#[derive(Debug, Deserialize)]
struct LeagueEvents {
    events: Vec<EventListing>,
}

#[derive(Debug, Deserialize)]
struct EventListing {
    url: String,
    local_start_date: String,
    local_end_date: String,
    #[serde(default)]
    timezone: Option<TimezoneLabel>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TimezoneLabel {
    value: String,
}

#[derive(Debug, Deserialize)]
struct EventResults {
    public_information: Value,
    d_cats: Vec<CategoryListing>,
}

/// One result category as listed in the event detail
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct CategoryListing {
    #[serde(rename = "dcat_name")]
    pub(crate) name: String,
    #[serde(rename = "discipline_kind")]
    pub(crate) discipline: String,
    #[serde(rename = "category_name")]
    pub(crate) category: String,
    pub(crate) full_results_url: String,
}

/// Event detail: metadata blob plus the category list
pub(crate) struct EventDetail {
    pub(crate) meta: Value,
    pub(crate) categories: Vec<CategoryListing>,
}

// ---------------------------------------------------------------------------
// Fetch operations
// ---------------------------------------------------------------------------

impl ResultsClient {
    pub(crate) fn new(base_url: &str, queue: BoundedQueue) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::config("base_url", format!("invalid URL {base_url:?}: {e}")))?;
        let endpoint = base
            .join(RESULTS_API_PATH)
            .map_err(|e| Error::config("base_url", format!("cannot join endpoint path: {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            queue,
        })
    }

    /// Fetch the season index (the traversal root)
    ///
    /// Unprotected: transport and shape failures here abort the whole run.
    pub(crate) async fn season_index(&self) -> Result<Vec<SeasonListing>> {
        let index: SeasonIndex = self.get(&[("api", "index")]).await?;
        Ok(index.seasons)
    }

    /// Fetch a league's event listing, parsed into [`Event`] skeletons
    ///
    /// Returns `None` as the failure marker for the whole league: transport
    /// failure, malformed body, or any single event whose id extraction or
    /// interval conversion fails poisons the entire listing (positional
    /// correspondence within a half-parsed listing would be meaningless).
    pub(crate) async fn league_events(&self, league_id: u64) -> Option<Vec<Event>> {
        match self.try_league_events(league_id).await {
            Ok(events) => Some(events),
            Err(error) => {
                tracing::warn!(league_id, %error, "league events fetch failed");
                None
            }
        }
    }

    async fn try_league_events(&self, league_id: u64) -> Result<Vec<Event>> {
        let league = league_id.to_string();
        let listing: LeagueEvents = self
            .get(&[("api", "season_leagues_results"), ("league", &league)])
            .await?;
        listing.events.into_iter().map(parse_event).collect()
    }

    /// Fetch an event's detail: metadata and category list
    ///
    /// Returns `None` as the failure marker; the caller keeps the event's
    /// listing-derived fields either way.
    pub(crate) async fn event_detail(&self, event_id: &str) -> Option<EventDetail> {
        let fetched: Result<EventResults> = self
            .get(&[("api", "event_results"), ("event_id", event_id)])
            .await;
        match fetched {
            Ok(results) => Some(EventDetail {
                meta: results.public_information,
                categories: results.d_cats,
            }),
            Err(error) => {
                tracing::warn!(event_id, %error, "event detail fetch failed");
                None
            }
        }
    }

    /// Fetch a category's full results
    ///
    /// Returns the empty sequence as the failure marker for this category
    /// only; sibling categories are unaffected.
    pub(crate) async fn category_results(&self, result_url: &str) -> Vec<Value> {
        match self.try_category_results(result_url).await {
            Ok(rankings) => rankings,
            Err(error) => {
                tracing::warn!(result_url, %error, "category results fetch failed");
                Vec::new()
            }
        }
    }

    async fn try_category_results(&self, result_url: &str) -> Result<Vec<Value>> {
        let payload: Value = self
            .get(&[("api", "event_full_results"), ("result_url", result_url)])
            .await?;
        match payload {
            Value::Array(rankings) => Ok(rankings),
            other => Err(ShapeError::NotRankings {
                got: json_type_name(&other),
            }
            .into()),
        }
    }

    /// One queue-admitted HTTP round trip: send, check status, decode JSON
    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let request = self.http.get(self.endpoint.clone()).query(params);
        self.queue
            .submit(async move {
                let response = request.send().await?.error_for_status()?;
                Ok(response.json::<T>().await?)
            })
            .await
    }
}

/// Turn a wire event listing into an [`Event`] skeleton
///
/// The id is extracted exactly once, here; the interval conversion to the
/// declared timezone happens here too, after which the interval is final.
fn parse_event(listing: EventListing) -> Result<Event> {
    let EventListing {
        url,
        local_start_date,
        local_end_date,
        timezone,
        extra,
    } = listing;

    let id = extract_event_id(&url).ok_or_else(|| ShapeError::MissingEventId { url })?;
    let time = TimeInterval::from_local(
        &local_start_date,
        &local_end_date,
        timezone.as_ref().map(|label| label.value.as_str()),
    )?;

    Ok(Event {
        id,
        time,
        meta: None,
        results: Vec::new(),
        extra,
    })
}

fn extract_event_id(url: &str) -> Option<String> {
    EVENT_ID
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_id_is_extracted_from_canonical_urls() {
        assert_eq!(
            extract_event_id("https://components.ifsc-climbing.org/api/v1/events/1291"),
            Some("1291".to_string())
        );
        assert_eq!(
            extract_event_id("/api/v1/events/7/registrations"),
            Some("7".to_string())
        );
    }

    #[test]
    fn urls_without_an_event_id_yield_none() {
        assert_eq!(extract_event_id("/api/v1/leagues/418"), None);
        assert_eq!(extract_event_id("/api/v1/events/"), None);
        assert_eq!(extract_event_id(""), None);
    }

    #[test]
    fn parse_event_builds_a_skeleton_with_listing_fields() {
        let listing: EventListing = serde_json::from_value(json!({
            "url": "/api/v1/events/1291",
            "local_start_date": "2024-04-08",
            "local_end_date": "2024-04-10",
            "timezone": { "value": "Asia/Tokyo" },
            "name": "Test Event",
        }))
        .unwrap();

        let event = parse_event(listing).unwrap();
        assert_eq!(event.id, "1291");
        assert_eq!(event.time.start.to_rfc3339(), "2024-04-08T00:00:00+09:00");
        assert!(event.meta.is_none());
        assert!(event.results.is_empty());
        assert_eq!(event.extra["name"], "Test Event");
        // Consumed wire fields must not leak into the assembled event.
        assert!(event.extra.get("url").is_none());
        assert!(event.extra.get("local_start_date").is_none());
    }

    #[test]
    fn parse_event_fails_as_a_whole_on_a_bad_url() {
        let listing: EventListing = serde_json::from_value(json!({
            "url": "/api/v1/not-an-event",
            "local_start_date": "2024-04-08",
            "local_end_date": "2024-04-10",
        }))
        .unwrap();

        let err = parse_event(listing).unwrap_err();
        assert!(matches!(
            err,
            Error::Shape(ShapeError::MissingEventId { .. })
        ));
    }

    #[test]
    fn category_listing_renames_wire_fields() {
        let listing: CategoryListing = serde_json::from_value(json!({
            "dcat_name": "Boulder Men",
            "discipline_kind": "boulder",
            "category_name": "men",
            "full_results_url": "/api/v1/events/1291/result/1",
        }))
        .unwrap();
        assert_eq!(listing.name, "Boulder Men");
        assert_eq!(listing.discipline, "boulder");
        assert_eq!(listing.category, "men");
    }

    #[test]
    fn client_rejects_an_unparseable_base_url() {
        let queue = BoundedQueue::new(1);
        let err = ResultsClient::new("not a url", queue).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
