mod error;
pub mod extract;
pub mod fetch;

pub use error::ScoreError;

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::roster::{Entity, EntityId, EntityLister, ExternalLookup};
use crate::transport::Transport;

/// Final output of a batch lookup: one entry per input entity.
pub type ScoreMap = HashMap<EntityId, u64>;

/// Upper bound on concurrently in-flight fetches. One future per ranked
/// entity would grow without limit on large rosters.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Concurrent score lookup against the external ranking site.
///
/// Stateless between calls: no cache, no persisted history. Each batch is
/// a best-effort, one-shot scrape.
pub struct Scorer {
    transport: Arc<dyn Transport>,
    site: String,
    max_in_flight: usize,
}

impl Scorer {
    pub fn new(transport: Arc<dyn Transport>, site: impl Into<String>) -> Self {
        Self {
            transport,
            site: site.into(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Cap the number of concurrently in-flight fetches (minimum 1).
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Score the full roster: ask the lister for every entity (empty
    /// filter), then delegate to [`Scorer::scores_by_list`].
    pub async fn scores(&self, roster: &dyn EntityLister) -> Result<ScoreMap, ScoreError> {
        let entities = roster.list("").await?;
        self.scores_by_list(&entities).await
    }

    /// Score a list of entities, fail-fast.
    ///
    /// Entities without lookup metadata get score 0 and never touch the
    /// network. The rest are fetched concurrently, at most
    /// `max_in_flight` at a time. The first error aborts the whole batch:
    /// remaining in-flight requests are cancelled and the error is
    /// returned with no partial map. Callers that want partial results
    /// use [`Scorer::scores_with_failures`] instead.
    ///
    /// On success the map holds exactly one entry per input entity.
    pub async fn scores_by_list(&self, entities: &[Entity]) -> Result<ScoreMap, ScoreError> {
        let mut scores = ScoreMap::with_capacity(entities.len());
        let mut ranked = Vec::new();

        for entity in entities {
            match entity.lookup_target() {
                Some(lookup) => ranked.push((entity.id, lookup.clone())),
                None => {
                    scores.insert(entity.id, 0);
                }
            }
        }

        let mut queue = ranked.into_iter();
        let mut in_flight = FuturesUnordered::new();

        // Fill initial batch
        for _ in 0..self.max_in_flight {
            if let Some((id, lookup)) = queue.next() {
                in_flight.push(self.lookup_task(id, lookup));
            }
        }

        // Join: collect each result, feeding the next lookup as one
        // completes. Dropping `in_flight` on the error path cancels
        // whatever is still running.
        while let Some((id, result)) = in_flight.next().await {
            scores.insert(id, result?);

            if let Some((id, lookup)) = queue.next() {
                in_flight.push(self.lookup_task(id, lookup));
            }
        }

        Ok(scores)
    }

    /// Fail-soft variant: every entity is attempted, successes land in
    /// the map and failures are reported per entity alongside it.
    pub async fn scores_with_failures(
        &self,
        entities: &[Entity],
    ) -> (ScoreMap, Vec<(EntityId, ScoreError)>) {
        let mut scores = ScoreMap::with_capacity(entities.len());
        let mut failures = Vec::new();
        let mut ranked = Vec::new();

        for entity in entities {
            match entity.lookup_target() {
                Some(lookup) => ranked.push((entity.id, lookup.clone())),
                None => {
                    scores.insert(entity.id, 0);
                }
            }
        }

        let mut queue = ranked.into_iter();
        let mut in_flight = FuturesUnordered::new();

        for _ in 0..self.max_in_flight {
            if let Some((id, lookup)) = queue.next() {
                in_flight.push(self.lookup_task(id, lookup));
            }
        }

        while let Some((id, result)) = in_flight.next().await {
            match result {
                Ok(score) => {
                    scores.insert(id, score);
                }
                Err(err) => failures.push((id, err)),
            }

            if let Some((id, lookup)) = queue.next() {
                in_flight.push(self.lookup_task(id, lookup));
            }
        }

        (scores, failures)
    }

    /// Score a single entity. Entities without lookup metadata score 0.
    pub async fn score(&self, entity: &Entity) -> Result<u64, ScoreError> {
        match entity.lookup_target() {
            Some(lookup) => self.lookup(lookup).await,
            None => Ok(0),
        }
    }

    // Named helper so both the fill and the feed loop push the same
    // future type into FuturesUnordered.
    async fn lookup_task(
        &self,
        id: EntityId,
        lookup: ExternalLookup,
    ) -> (EntityId, Result<u64, ScoreError>) {
        (id, self.lookup(&lookup).await)
    }

    async fn lookup(&self, lookup: &ExternalLookup) -> Result<u64, ScoreError> {
        let url = ranking_url(&self.site, &lookup.region, &lookup.locale);
        let page = fetch::fetch_body(self.transport.as_ref(), &url).await?;
        extract::extract_score(&page, &lookup.search_key)
    }
}

/// The ranking page for a region/locale pair. Path and query shape are
/// dictated by the external site.
pub fn ranking_url(site: &str, region: &str, locale: &str) -> String {
    format!(
        "{}/{}/scorecard/ranking/?City={}",
        site.trim_end_matches('/'),
        region,
        locale
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::StaticRoster;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves the same page for every URL and counts requests.
    struct PageTransport {
        page: String,
        requests: AtomicUsize,
    }

    impl PageTransport {
        fn new(page: impl Into<String>) -> Self {
            Self {
                page: page.into(),
                requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for PageTransport {
        async fn get(&self, _url: &str) -> Result<reqwest::Response, ScoreError> {
            self.requests.fetch_add(1, Ordering::Relaxed);
            Ok(http::Response::new(self.page.clone()).into())
        }
    }

    /// Fails the test if any request is made at all.
    struct NoNetworkTransport;

    #[async_trait]
    impl Transport for NoNetworkTransport {
        async fn get(&self, url: &str) -> Result<reqwest::Response, ScoreError> {
            panic!("unexpected network call to {}", url);
        }
    }

    /// Refuses URLs whose city query matches `down_city`, serves the page
    /// for everything else.
    struct FlakyTransport {
        page: String,
        down_city: &'static str,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn get(&self, url: &str) -> Result<reqwest::Response, ScoreError> {
            if url.ends_with(self.down_city) {
                return Err(ScoreError::Transport {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            Ok(http::Response::new(self.page.clone()).into())
        }
    }

    const RANKING_PAGE: &str = concat!(
        r#"<a href="/de/user/jasmin-roeper" class="rank-name">1234</a>"#,
        r#"<a href="/de/user/mario-linke" class="rank-name">987</a>"#,
    );

    fn scorer(transport: impl Transport + 'static) -> Scorer {
        Scorer::new(Arc::new(transport), "https://ranking.test")
    }

    #[tokio::test]
    async fn empty_input_returns_empty_map_without_network() {
        let scores = scorer(NoNetworkTransport)
            .scores_by_list(&[])
            .await
            .unwrap();
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn unranked_entities_score_zero_without_network() {
        let entities = vec![
            Entity::unranked(1),
            Entity::ranked(2, "", "de", "Nuremberg"),
        ];
        let scores = scorer(NoNetworkTransport)
            .scores_by_list(&entities)
            .await
            .unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&1], 0);
        assert_eq!(scores[&2], 0);
    }

    #[tokio::test]
    async fn batch_returns_one_entry_per_entity() {
        let entities = vec![
            Entity::ranked(1, "jasmin-roeper", "de", "Nuremberg"),
            Entity::ranked(2, "mario-linke", "de", "Nuremberg"),
            Entity::unranked(3),
        ];
        let scores = scorer(PageTransport::new(RANKING_PAGE))
            .scores_by_list(&entities)
            .await
            .unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[&1], 1234);
        assert_eq!(scores[&2], 987);
        assert_eq!(scores[&3], 0);
    }

    #[tokio::test]
    async fn bounded_pool_drains_rosters_larger_than_the_cap() {
        let entities: Vec<Entity> = (1..=10)
            .map(|id| Entity::ranked(id, "jasmin-roeper", "de", "Nuremberg"))
            .collect();
        let transport = PageTransport::new(RANKING_PAGE);
        let scores = scorer(transport)
            .with_max_in_flight(2)
            .scores_by_list(&entities)
            .await
            .unwrap();
        assert_eq!(scores.len(), 10);
        assert!(scores.values().all(|&s| s == 1234));
    }

    #[tokio::test]
    async fn one_failed_fetch_aborts_the_batch() {
        let entities = vec![
            Entity::ranked(1, "jasmin-roeper", "de", "Nuremberg"),
            Entity::ranked(2, "mario-linke", "de", "Unreachable"),
        ];
        let transport = FlakyTransport {
            page: RANKING_PAGE.to_string(),
            down_city: "Unreachable",
        };
        let err = scorer(transport)
            .scores_by_list(&entities)
            .await
            .unwrap_err();
        assert!(matches!(err, ScoreError::Transport { .. }));
    }

    #[tokio::test]
    async fn missing_key_aborts_the_batch() {
        let entities = vec![Entity::ranked(1, "nobody-here", "de", "Nuremberg")];
        let err = scorer(PageTransport::new(RANKING_PAGE))
            .scores_by_list(&entities)
            .await
            .unwrap_err();
        assert!(matches!(err, ScoreError::KeyNotFound { .. }));
    }

    #[tokio::test]
    async fn fail_soft_variant_keeps_partial_results() {
        let entities = vec![
            Entity::ranked(1, "jasmin-roeper", "de", "Nuremberg"),
            Entity::ranked(2, "mario-linke", "de", "Unreachable"),
            Entity::unranked(3),
        ];
        let transport = FlakyTransport {
            page: RANKING_PAGE.to_string(),
            down_city: "Unreachable",
        };
        let (scores, failures) = scorer(transport).scores_with_failures(&entities).await;
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&1], 1234);
        assert_eq!(scores[&3], 0);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 2);
    }

    #[tokio::test]
    async fn scores_pulls_the_full_roster_from_the_lister() {
        let roster = StaticRoster::new(vec![
            Entity::ranked(1, "jasmin-roeper", "de", "Nuremberg"),
            Entity::unranked(4),
        ]);
        let scores = scorer(PageTransport::new(RANKING_PAGE))
            .scores(&roster)
            .await
            .unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&1], 1234);
        assert_eq!(scores[&4], 0);
    }

    #[tokio::test]
    async fn single_entity_lookup() {
        let transport = PageTransport::new(RANKING_PAGE);
        let scorer = scorer(transport);
        let ranked = Entity::ranked(1, "mario-linke", "de", "Nuremberg");
        assert_eq!(scorer.score(&ranked).await.unwrap(), 987);
        let unranked = Entity::unranked(2);
        assert_eq!(scorer.score(&unranked).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn one_request_per_ranked_entity() {
        let entities = vec![
            Entity::ranked(1, "jasmin-roeper", "de", "Nuremberg"),
            Entity::ranked(2, "mario-linke", "de", "Nuremberg"),
            Entity::unranked(3),
        ];
        let transport = Arc::new(PageTransport::new(RANKING_PAGE));
        let scorer = Scorer::new(transport.clone(), "https://ranking.test");
        scorer.scores_by_list(&entities).await.unwrap();
        assert_eq!(transport.requests.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn ranking_url_shape() {
        assert_eq!(
            ranking_url("https://www.8a.nu", "de", "Nuremberg"),
            "https://www.8a.nu/de/scorecard/ranking/?City=Nuremberg"
        );
        // trailing slash on the site must not double up
        assert_eq!(
            ranking_url("https://www.8a.nu/", "de", "Nuremberg"),
            "https://www.8a.nu/de/scorecard/ranking/?City=Nuremberg"
        );
    }
}
