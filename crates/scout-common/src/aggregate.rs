//! Runs the adapters, merges their candidates and ranks the survivors.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::{debug, error, info};

use crate::{
    keywords::Keywords,
    matching::{is_independent_builder, matches_region, ScoreEngine, ScoreSet},
    sources::{RegionPolicy, SourceAdapter},
    CandidateRecord, DiscoveryMethod,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub record: CandidateRecord,
    pub scores: ScoreSet,
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Drop candidates who look corporate-affiliated.
    pub independent_only: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            independent_only: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct AggregateReport {
    /// Highest overall score first.
    pub ranked: Vec<ScoredCandidate>,
    pub per_method: HashMap<DiscoveryMethod, usize>,
    pub failed_sources: Vec<DiscoveryMethod>,
}

impl AggregateReport {
    pub fn count(&self, method: DiscoveryMethod) -> usize {
        self.per_method.get(&method).copied().unwrap_or(0)
    }
}

pub struct Aggregator {
    config: AggregatorConfig,
    engine: ScoreEngine,
    keywords: Arc<Keywords>,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig, engine: ScoreEngine, keywords: Arc<Keywords>) -> Self {
        Self {
            config,
            engine,
            keywords,
        }
    }

    /// Invokes `sources` one after another. The first adapter to report an
    /// identity owns it; later sightings are dropped.
    pub async fn run(&self, sources: &[Box<dyn SourceAdapter>]) -> AggregateReport {
        let mut seen: HashSet<String> = HashSet::new();
        let mut merged: Vec<(CandidateRecord, RegionPolicy)> = Vec::new();
        let mut failed_sources = Vec::new();

        for source in sources {
            let method = source.method();
            info!(method = method.as_ref(), "running source");

            let records = match source.fetch().await {
                Ok(records) => records,
                Err(err) => {
                    error!(method = method.as_ref(), error = %err, "source failed; continuing");
                    failed_sources.push(method);
                    continue;
                }
            };

            let fetched = records.len();
            let mut added = 0usize;
            for record in records {
                if seen.insert(record.identity.clone()) {
                    merged.push((record, source.region_policy()));
                    added += 1;
                }
            }
            info!(method = method.as_ref(), fetched, added, "source finished");
        }

        let mut scored = Vec::with_capacity(merged.len());
        let mut per_method: HashMap<DiscoveryMethod, usize> = HashMap::new();
        for (record, policy) in merged {
            if !self.admits(&record, policy) {
                debug!(identity = %record.identity, "filtered out");
                continue;
            }
            *per_method.entry(record.method()).or_default() += 1;
            let scores = self.engine.score(&record);
            scored.push(ScoredCandidate { record, scores });
        }

        AggregateReport {
            ranked: rank(scored),
            per_method,
            failed_sources,
        }
    }

    fn admits(&self, record: &CandidateRecord, policy: RegionPolicy) -> bool {
        if policy == RegionPolicy::Unfiltered
            && !matches_region(Some(&record.location), &self.keywords.region)
        {
            return false;
        }
        !self.config.independent_only || is_independent_builder(record, &self.keywords)
    }
}

/// Stable sort, highest overall score first; equal scores keep their order.
pub fn rank(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| {
        b.scores
            .overall
            .partial_cmp(&a.scores.overall)
            .unwrap_or(Ordering::Equal)
    });
    candidates
}
