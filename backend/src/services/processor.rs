//! End-to-end processing of analysis and search requests.
//!
//! Analysis of a target:
//!
//! 1. Get or create the target in the repository.
//! 2. Fetch its calendar from the remote API.
//! 3. If the calendar checksum matches the stored one, return the stored
//!    bottlenecks.
//! 4. Otherwise replace the stored lessons and bottlenecks with freshly
//!    parsed and analyzed ones, then record the new checksum.
//!
//! Search runs the analysis for every target of one page of remote search
//! results.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::algorithms::BottleneckAnalyzer;
use crate::calendar::parse_lessons;
use crate::config::AppConfig;
use crate::db::checksum::calculate_checksum;
use crate::db::repository::FullRepository;
use crate::fetch::{RemoteApi, RemoteTarget};
use crate::models::{BottlenecksHydrated, SearchRequest, TargetKind};

use super::hydrate::{hydrate_from_repository, hydrate_with_lessons};

/// A search hit together with the analysis of its schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHydrated {
    pub name: String,
    pub target_type: i32,
    pub remote_id: i64,
    pub bottlenecks: BottlenecksHydrated,
}

/// One page of search results with their analyses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultHydrated {
    pub targets: Vec<TargetHydrated>,
    pub next_page_token: Option<String>,
}

/// Fetches, analyzes and stores schedules.
pub struct BottleneckService {
    repository: Arc<dyn FullRepository>,
    remote: Arc<dyn RemoteApi>,
    analyzer: BottleneckAnalyzer,
    do_checksum_check: bool,
}

impl BottleneckService {
    pub fn new(
        repository: Arc<dyn FullRepository>,
        remote: Arc<dyn RemoteApi>,
        analyzer: BottleneckAnalyzer,
        do_checksum_check: bool,
    ) -> Self {
        Self {
            repository,
            remote,
            analyzer,
            do_checksum_check,
        }
    }

    pub fn from_config(
        repository: Arc<dyn FullRepository>,
        remote: Arc<dyn RemoteApi>,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            repository,
            remote,
            BottleneckAnalyzer::new(config.analysis.clone()),
            config.app.do_checksum_check,
        )
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repository
    }

    /// Analyze the schedule of one target.
    ///
    /// Returns `Ok(None)` when the remote API has no calendar for the target.
    pub async fn process_analysis(
        &self,
        kind: TargetKind,
        remote_id: i64,
    ) -> anyhow::Result<Option<BottlenecksHydrated>> {
        let target = self
            .repository
            .get_or_create_target(kind, remote_id)
            .await?;
        let key = target.key();

        let Some(calendar) = self.remote.fetch_calendar(&target).await? else {
            log::warn!("No calendar available for target {}", key);
            return Ok(None);
        };
        let checksum = calculate_checksum(&calendar);

        if self.do_checksum_check
            && self.repository.get_checksum(&key).await?.as_deref() == Some(checksum.as_str())
        {
            log::info!("Calendar of target {} unchanged, reusing stored bottlenecks", key);
            let bottlenecks = self.repository.find_bottlenecks(&key).await?;
            let hydrated =
                hydrate_from_repository(self.repository.as_ref(), &key, &bottlenecks).await?;
            return Ok(Some(hydrated));
        }

        self.repository.clear_lessons(&key).await?;
        self.repository.clear_bottlenecks(&key).await?;

        let lessons = parse_lessons(&calendar)?;
        let lessons = self.repository.add_lessons(&key, &lessons).await?;

        let bottlenecks = self.analyzer.analyze(&lessons)?;
        let bottlenecks = self.repository.add_bottlenecks(&key, &bottlenecks).await?;

        self.repository.set_checksum(&key, &checksum).await?;

        log::info!(
            "Analyzed target {}: {} lessons, {} bottlenecks",
            key,
            lessons.len(),
            bottlenecks.len()
        );

        Ok(Some(hydrate_with_lessons(&bottlenecks, &lessons)?))
    }

    /// Search the remote API and analyze every target found.
    ///
    /// Targets of an unknown kind, and targets without a calendar, come back
    /// with empty bottlenecks. Returns `Ok(None)` when the search itself
    /// yielded nothing.
    pub async fn process_search(
        &self,
        request: &SearchRequest,
    ) -> anyhow::Result<Option<SearchResultHydrated>> {
        let Some(result) = self.remote.fetch_targets(request).await? else {
            log::warn!("Remote search returned nothing for {:?}", request);
            return Ok(None);
        };

        let targets = try_join_all(
            result
                .targets
                .into_iter()
                .map(|target| self.hydrate_target(target)),
        )
        .await?;

        Ok(Some(SearchResultHydrated {
            targets,
            next_page_token: result.next_page_token,
        }))
    }

    async fn hydrate_target(&self, target: RemoteTarget) -> anyhow::Result<TargetHydrated> {
        let bottlenecks = match TargetKind::from_code(target.target_type) {
            Some(kind) => self
                .process_analysis(kind, target.remote_id)
                .await?
                .unwrap_or_default(),
            None => {
                log::debug!(
                    "Skipping analysis of {} with target type {}",
                    target.name,
                    target.target_type
                );
                BottlenecksHydrated::default()
            }
        };

        Ok(TargetHydrated {
            name: target.name,
            target_type: target.target_type,
            remote_id: target.remote_id,
            bottlenecks,
        })
    }
}
