use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use super::{
    github::{candidate_from_profile, fetch_profile, in_region, repo_url},
    ListingTally, RegionPolicy, SourceAdapter, SourceContext, SourceError,
};
use crate::{
    http::{FetchRequest, GITHUB_WEB_BASE},
    CandidateRecord, Discovery, DiscoveryMethod,
};

pub const TRENDING_LANGUAGES: &[Option<&str>] = &[
    None,
    Some("python"),
    Some("typescript"),
    Some("javascript"),
    Some("rust"),
    Some("go"),
];
pub const TRENDING_WINDOWS: &[&str] = &["daily", "weekly"];
pub const TRENDING_PAGE_LIMIT: usize = 25;
const PACE_PER_OWNER: f64 = 0.5;

static RE_ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<article[^>]*class="[^"]*\bBox-row\b[^"]*"[^>]*>(.*?)</article>"#)
        .unwrap()
});

static RE_HEADING_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<h2[^>]*>.*?<a[^>]*\bhref="([^"]+)""#).unwrap());

/// Extracts `owner/repo` paths from the trending listing, one per article block.
pub fn parse_trending_repos(html: &str, limit: usize) -> Vec<String> {
    RE_ARTICLE
        .captures_iter(html)
        .filter_map(|article| {
            let block = article.get(1)?.as_str();
            let href = RE_HEADING_LINK.captures(block)?.get(1)?.as_str();
            let path = href.trim().trim_matches('/');
            (!path.is_empty()).then(|| path.to_string())
        })
        .take(limit)
        .collect()
}

pub fn trending_url(language: Option<&str>) -> String {
    match language {
        Some(language) => format!("{GITHUB_WEB_BASE}/trending/{language}"),
        None => format!("{GITHUB_WEB_BASE}/trending"),
    }
}

#[derive(Debug, Default, Deserialize)]
struct RepoSummary {
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    description: Option<String>,
}

pub struct TrendingSource {
    ctx: SourceContext,
}

impl TrendingSource {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }

    async fn owner_candidate(&self, repo: &str, owner: &str) -> Option<CandidateRecord> {
        let user = fetch_profile(&self.ctx, owner).await?;
        if !in_region(&user, &self.ctx.keywords.region) {
            return None;
        }

        // a missing repository still yields the candidate, without star data
        let summary = match self
            .ctx
            .client
            .get_json::<RepoSummary>(&FetchRequest::github(repo_url(repo)))
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                warn!(repo, error = %err, "repository lookup failed");
                RepoSummary::default()
            }
        };

        let discovery = Discovery::Trending {
            repo: repo.to_string(),
            repo_stars: summary.stargazers_count,
            repo_description: summary.description.filter(|d| !d.is_empty()),
        };
        let record = candidate_from_profile(&self.ctx, user, discovery).await;
        info!(login = %record.identity, repo, "trending candidate");
        Some(record)
    }
}

#[async_trait]
impl SourceAdapter for TrendingSource {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::Trending
    }

    fn region_policy(&self) -> RegionPolicy {
        RegionPolicy::Prefiltered
    }

    async fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError> {
        let mut records = Vec::new();
        let mut seen_owners: HashSet<String> = HashSet::new();
        let mut tally = ListingTally::default();

        for &language in TRENDING_LANGUAGES {
            for &window in TRENDING_WINDOWS {
                let request = FetchRequest::html(trending_url(language)).param("since", window);
                let page = self.ctx.client.get_text(&request).await;
                tally.record(&page);

                let html = match page {
                    Ok(html) => html,
                    Err(err) => {
                        warn!(language = language.unwrap_or("all"), window, error = %err, "trending page unavailable");
                        continue;
                    }
                };

                for repo in parse_trending_repos(&html, TRENDING_PAGE_LIMIT) {
                    let owner = repo.split('/').next().unwrap_or_default().to_string();
                    if owner.is_empty() || !seen_owners.insert(owner.clone()) {
                        continue;
                    }

                    if let Some(record) = self.owner_candidate(&repo, &owner).await {
                        records.push(record);
                    }
                    self.ctx.client.pace(PACE_PER_OWNER).await;
                }
            }
        }

        tally.finish(self.method(), records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{stub::StubFetch, FetchResponse};
    use crate::sources::{github::fixtures, testing::context};
    use serde_json::json;

    fn article(path: &str) -> String {
        format!(
            r#"<article class="Box-row">
  <h2 class="h3 lh-condensed">
    <a data-view-component="true" href="/{path}" class="Link">
      <span class="text-normal">{path}</span>
    </a>
  </h2>
  <p class="col-9">A repo</p>
  <a href="/{path}/stargazers">1,234</a>
</article>"#
        )
    }

    #[test]
    fn parses_repo_paths_from_article_blocks() {
        let html = format!(
            "<div>{}{}<article class=\"other\"><h2><a href=\"/x/y\"></a></h2></article></div>",
            article("alice/agents"),
            article("bob/rag")
        );
        assert_eq!(
            parse_trending_repos(&html, 25),
            vec!["alice/agents".to_string(), "bob/rag".to_string()]
        );
    }

    #[test]
    fn caps_results_per_page() {
        let html: String = (0..30).map(|i| article(&format!("o{i}/r{i}"))).collect();
        assert_eq!(parse_trending_repos(&html, TRENDING_PAGE_LIMIT).len(), 25);
    }

    #[test]
    fn builds_language_urls() {
        assert_eq!(trending_url(None), "https://github.com/trending");
        assert_eq!(trending_url(Some("rust")), "https://github.com/trending/rust");
    }

    #[tokio::test]
    async fn keeps_only_regional_owners_once() {
        let page = format!(
            "{}{}{}",
            article("alice/agents"),
            article("alice/other"),
            article("bob/rag")
        );
        let stub = StubFetch::new()
            .with(
                "https://github.com/trending?since=daily",
                FetchResponse::ok(page),
            )
            .json("https://api.github.com/users/alice", fixtures::user("alice", "Bengaluru"))
            .json("https://api.github.com/users/bob", fixtures::user("bob", "Berlin"))
            .json(
                "https://api.github.com/repos/alice/agents",
                json!({"stargazers_count": 900, "description": "Agent runtime"}),
            );
        let (ctx, stub) = context(stub);

        let records = TrendingSource::new(ctx).fetch().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity, "alice");
        assert_eq!(
            records[0].discovery,
            Discovery::Trending {
                repo: "alice/agents".into(),
                repo_stars: 900,
                repo_description: Some("Agent runtime".into()),
            }
        );
        let alice_lookups = stub
            .calls()
            .iter()
            .filter(|c| c.as_str() == "https://api.github.com/users/alice")
            .count();
        assert_eq!(alice_lookups, 1);
        // bob is outside the region, so his repository is never looked up
        assert!(!stub.calls().iter().any(|c| c.contains("repos/bob")));
    }

    #[tokio::test]
    async fn all_pages_failing_is_an_adapter_error() {
        let (ctx, _) = context(StubFetch::new());
        let err = TrendingSource::new(ctx).fetch().await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::AllCallsFailed {
                attempted: 12,
                ..
            }
        ));
    }
}
