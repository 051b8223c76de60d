//! GitHub REST shapes and the profile/activity helpers shared by the GitHub adapters.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{SourceContext, PIONEER_SAMPLE, RECENT_ACTIVITY_DAYS};
use crate::{
    http::{FetchRequest, GITHUB_API_BASE},
    keywords::KeywordSet,
    matching::matches_region,
    ActivitySignals, CandidateRecord, Discovery, LanguageShare,
};

const OWNER_REPOS_PAGE: u32 = 30;
const TOP_REPOS: usize = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRepo {
    pub full_name: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    pub owner: Option<RepoOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchUserHit {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContributorEntry {
    pub login: String,
    #[serde(default)]
    pub contributions: u64,
}

pub fn user_url(login: &str) -> String {
    format!("{GITHUB_API_BASE}/users/{login}")
}

pub fn repo_url(full_name: &str) -> String {
    format!("{GITHUB_API_BASE}/repos/{full_name}")
}

/// Profile lookup; any failure is logged and yields `None`.
pub async fn fetch_profile(ctx: &SourceContext, login: &str) -> Option<GithubUser> {
    match ctx
        .client
        .get_json::<GithubUser>(&FetchRequest::github(user_url(login)))
        .await
    {
        Ok(user) => Some(user),
        Err(err) => {
            warn!(login, error = %err, "profile lookup failed; skipping candidate");
            None
        }
    }
}

pub fn in_region(user: &GithubUser, region: &KeywordSet) -> bool {
    matches_region(user.location.as_deref(), region)
}

fn non_empty(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Normalizes a profile into a candidate record.
pub fn profile_record(user: GithubUser, discovery: Discovery) -> CandidateRecord {
    let mut record = CandidateRecord::new(user.login, discovery);
    if let Some(name) = user.name.filter(|n| !n.trim().is_empty()) {
        record.display_name = name.trim().to_string();
    }
    record.bio = non_empty(user.bio);
    record.location = non_empty(user.location);
    record.company = non_empty(user.company);
    record.blog = non_empty(user.blog);
    record.twitter = non_empty(user.twitter_username);
    record.avatar_url = non_empty(user.avatar_url);
    record.profile_url = user
        .html_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| format!("https://github.com/{}", record.identity));
    record.follower_count = user.followers;
    record.public_artifact_count = user.public_repos;
    record
}

/// Builds the record and, when enabled, attaches activity signals from the owner's repositories.
pub async fn candidate_from_profile(
    ctx: &SourceContext,
    user: GithubUser,
    discovery: Discovery,
) -> CandidateRecord {
    let created_at = user.created_at;
    let mut record = profile_record(user, discovery);
    record.activity.account_age_days = created_at.map(|at| (ctx.now - at).num_days());

    if ctx.enrich_activity {
        let request = FetchRequest::github(format!("{}/repos", user_url(&record.identity)))
            .param("sort", "pushed")
            .param("per_page", OWNER_REPOS_PAGE);
        match ctx.client.get_json::<Vec<GithubRepo>>(&request).await {
            Ok(repos) => {
                let age = record.activity.account_age_days;
                record.activity = repo_activity(&repos, &ctx.keywords.pioneer, ctx.now);
                record.activity.account_age_days = age;
            }
            Err(err) => {
                debug!(login = %record.identity, error = %err, "repository list unavailable; keeping profile only");
            }
        }
    }

    record
}

/// Derives activity signals from a repository list ordered by most recent push.
pub fn repo_activity(
    repos: &[GithubRepo],
    pioneer: &KeywordSet,
    now: DateTime<Utc>,
) -> ActivitySignals {
    let recent_cutoff = now - Duration::days(RECENT_ACTIVITY_DAYS);

    let total_stars = repos.iter().map(|r| r.stargazers_count).sum();
    let recent = repos
        .iter()
        .filter(|r| r.pushed_at.is_some_and(|at| at >= recent_cutoff))
        .count() as u32;
    let pioneer_hits = repos
        .iter()
        .take(PIONEER_SAMPLE)
        .filter(|r| {
            let text = format!(
                "{} {}",
                r.description.as_deref().unwrap_or_default(),
                r.topics.join(" ")
            );
            pioneer.matches(&text)
        })
        .count() as u32;

    let mut by_stars: Vec<&GithubRepo> = repos.iter().collect();
    by_stars.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    let top_repos = by_stars
        .into_iter()
        .take(TOP_REPOS)
        .map(|r| r.full_name.clone())
        .collect();

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for language in repos.iter().filter_map(|r| r.language.as_deref()) {
        *counts.entry(language).or_default() += 1;
    }
    let mut languages: Vec<LanguageShare> = counts
        .into_iter()
        .map(|(language, count)| LanguageShare {
            language: language.to_string(),
            count,
        })
        .collect();
    languages.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.language.cmp(&b.language)));

    ActivitySignals {
        total_stars: Some(total_stars),
        account_age_days: None,
        recent_artifacts: Some(recent),
        pioneer_hits,
        top_repos,
        languages,
    }
}
