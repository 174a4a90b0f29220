//! Hierarchical traversal engine
//!
//! Expands each resource node into its full subtree: seasons fan out into
//! leagues, leagues into events, events into category results. Every level
//! spawns one concurrent future per child, collects them with
//! [`join_all`], and only resolves once the whole group has — so completion
//! propagates bottom-up and a parent is never considered done while a
//! descendant is still in flight.
//!
//! `join_all` returns results in the order the futures were given, not the
//! order they completed, which is what keeps every child sequence in the
//! same position and length as the API listing even when siblings finish
//! out of order or fail.

use futures::future::join_all;

use crate::client::{CategoryListing, LeagueListing, ResultsClient, SeasonListing};
use crate::config::FailedLeaguePolicy;
use crate::types::{CategoryResult, Event, League, Season};

/// Traversal engine: the fetcher plus the partial-failure policy
pub(crate) struct Traversal {
    client: ResultsClient,
    failed_league_policy: FailedLeaguePolicy,
}

impl Traversal {
    pub(crate) fn new(client: ResultsClient, failed_league_policy: FailedLeaguePolicy) -> Self {
        Self {
            client,
            failed_league_policy,
        }
    }

    /// Expand every season of the index listing concurrently
    pub(crate) async fn expand_seasons(&self, listings: Vec<SeasonListing>) -> Vec<Season> {
        join_all(listings.into_iter().map(|season| self.expand_season(season))).await
    }

    /// Expand one season: fan out over its leagues
    async fn expand_season(&self, listing: SeasonListing) -> Season {
        let SeasonListing { leagues, extra } = listing;
        let leagues = join_all(leagues.into_iter().map(|league| self.expand_league(league))).await;
        Season { leagues, extra }
    }

    /// Expand one league: fetch its events, then fan out over them
    ///
    /// A failed events fetch becomes either a placeholder league (listing
    /// fields kept, empty event sequence) or an explicit null slot,
    /// depending on the configured policy. The slot itself always survives.
    async fn expand_league(&self, listing: LeagueListing) -> Option<League> {
        match self.client.league_events(listing.id).await {
            Some(events) => {
                let events =
                    join_all(events.into_iter().map(|event| self.expand_event(event))).await;
                Some(League {
                    id: listing.id,
                    events,
                    extra: listing.extra,
                })
            }
            None => match self.failed_league_policy {
                FailedLeaguePolicy::Placeholder => Some(League {
                    id: listing.id,
                    events: Vec::new(),
                    extra: listing.extra,
                }),
                FailedLeaguePolicy::Null => None,
            },
        }
    }

    /// Expand one event: fetch its detail, then fan out over its categories
    ///
    /// If the detail fetch fails the event keeps its listing-derived fields
    /// with meta absent and no results.
    async fn expand_event(&self, mut event: Event) -> Event {
        if let Some(detail) = self.client.event_detail(&event.id).await {
            let results = join_all(
                detail
                    .categories
                    .into_iter()
                    .map(|category| self.expand_category(category)),
            )
            .await;
            event.meta = Some(detail.meta);
            event.results = results;
        }
        event
    }

    /// Expand one category: fetch its full results
    async fn expand_category(&self, listing: CategoryListing) -> CategoryResult {
        let rankings = self.client.category_results(&listing.full_results_url).await;
        CategoryResult {
            name: listing.name,
            discipline: listing.discipline,
            category: listing.category,
            rankings,
        }
    }
}
