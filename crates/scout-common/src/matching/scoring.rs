use serde::{Deserialize, Serialize};

use super::weights::{Weights, CANONICAL_WEIGHTS};
use crate::CandidateRecord;

pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub weights: Weights,
    /// Used when a signal is unknown.
    pub neutral_score: f64,
    pub growth_per_star_day: f64,
    pub velocity_per_recent_artifact: f64,
    pub velocity_per_contribution: f64,
    pub hidden_gem_stars_per_artifact: f64,
    pub hidden_gem_multiplier: f64,
    pub pioneer_per_hit: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: CANONICAL_WEIGHTS,
            neutral_score: 50.0,
            growth_per_star_day: 50.0,
            velocity_per_recent_artifact: 20.0,
            velocity_per_contribution: 2.0,
            hidden_gem_stars_per_artifact: 5.0,
            hidden_gem_multiplier: 15.0,
            pioneer_per_hit: 15.0,
        }
    }
}

/// Sub-scores are clamped to `[0, 100]`; `overall` is the weighted sum and is not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub growth: f64,
    pub velocity: f64,
    pub hidden_gem: f64,
    pub pioneer: f64,
    pub overall: f64,
}

pub struct ScoreEngine {
    config: ScoringConfig,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl ScoreEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, record: &CandidateRecord) -> ScoreSet {
        let growth = self.score_growth(record);
        let velocity = self.score_velocity(record);
        let hidden_gem = self.score_hidden_gem(record);
        let pioneer = self.score_pioneer(record);

        let weights = self.config.weights;
        let overall = growth * weights.growth
            + velocity * weights.velocity
            + hidden_gem * weights.hidden_gem
            + pioneer * weights.pioneer;

        ScoreSet {
            growth,
            velocity,
            hidden_gem,
            pioneer,
            overall,
        }
    }

    fn score_growth(&self, record: &CandidateRecord) -> f64 {
        match record.activity.account_age_days {
            Some(age) if age > 0 => clamp_score(
                total_stars(record) as f64 / age as f64 * self.config.growth_per_star_day,
            ),
            _ => self.config.neutral_score,
        }
    }

    /// Recent activity wins over contribution counts when both are known.
    fn score_velocity(&self, record: &CandidateRecord) -> f64 {
        if let Some(recent) = record.activity.recent_artifacts {
            return clamp_score(recent as f64 * self.config.velocity_per_recent_artifact);
        }

        match record.discovery.contributions() {
            Some(contributions) => clamp_score(
                self.config.neutral_score
                    + contributions as f64 * self.config.velocity_per_contribution,
            ),
            None => self.config.neutral_score,
        }
    }

    fn score_hidden_gem(&self, record: &CandidateRecord) -> f64 {
        let output = total_stars(record) as f64
            + record.public_artifact_count as f64 * self.config.hidden_gem_stars_per_artifact;
        let attention = record.follower_count.max(1) as f64;
        clamp_score(output / attention * self.config.hidden_gem_multiplier)
    }

    fn score_pioneer(&self, record: &CandidateRecord) -> f64 {
        clamp_score(record.activity.pioneer_hits as f64 * self.config.pioneer_per_hit)
    }
}

/// Stars summed over the candidate's artifacts, else those of the artifact it was found through.
fn total_stars(record: &CandidateRecord) -> u64 {
    record
        .activity
        .total_stars
        .or_else(|| record.discovery.attributed_stars())
        .unwrap_or(0)
}

pub fn clamp_score(value: f64) -> f64 {
    value.max(0.0).min(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActivitySignals, Discovery};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn enriched_record() -> CandidateRecord {
        let mut record = CandidateRecord::new("builder", Discovery::Keyword);
        record.follower_count = 200;
        record.public_artifact_count = 20;
        record.activity = ActivitySignals {
            total_stars: Some(500),
            account_age_days: Some(500),
            recent_artifacts: Some(3),
            pioneer_hits: 2,
            ..ActivitySignals::default()
        };
        record
    }

    #[test]
    fn scores_reference_candidate() {
        let score = ScoreEngine::default().score(&enriched_record());

        assert!(approx(score.growth, 50.0));
        assert!(approx(score.velocity, 60.0));
        assert!(approx(score.hidden_gem, 45.0));
        assert!(approx(score.pioneer, 30.0));
        assert!(approx(score.overall, 46.75));
    }

    #[test]
    fn unknown_age_falls_back_to_neutral_growth() {
        let mut record = enriched_record();
        record.activity.account_age_days = None;
        assert!(approx(ScoreEngine::default().score(&record).growth, 50.0));

        record.activity.account_age_days = Some(0);
        assert!(approx(ScoreEngine::default().score(&record).growth, 50.0));
    }

    #[test]
    fn contributions_drive_velocity_without_recent_activity() {
        let mut record = CandidateRecord::new(
            "contrib",
            Discovery::Contributor {
                project: "langchain-ai/langchain".into(),
                contributions: 12,
            },
        );
        let engine = ScoreEngine::default();
        assert!(approx(engine.score(&record).velocity, 74.0));

        record.activity.recent_artifacts = Some(1);
        assert!(approx(engine.score(&record).velocity, 20.0));
    }

    #[test]
    fn velocity_defaults_to_baseline() {
        let record = CandidateRecord::new("plain", Discovery::Keyword);
        assert!(approx(ScoreEngine::default().score(&record).velocity, 50.0));
    }

    #[test]
    fn attributed_stars_used_when_totals_missing() {
        let mut record = CandidateRecord::new(
            "trend",
            Discovery::Trending {
                repo: "trend/repo".into(),
                repo_stars: 100,
                repo_description: None,
            },
        );
        record.follower_count = 100;
        let score = ScoreEngine::default().score(&record);
        // (100 + 0) / 100 * 15
        assert!(approx(score.hidden_gem, 15.0));
    }

    #[test]
    fn sub_scores_stay_within_bounds() {
        let mut huge = enriched_record();
        huge.follower_count = 0;
        huge.activity.total_stars = Some(1_000_000);
        huge.activity.account_age_days = Some(1);
        huge.activity.recent_artifacts = Some(90);
        huge.activity.pioneer_hits = 10;

        let empty = CandidateRecord::new("nobody", Discovery::Keyword);
        let engine = ScoreEngine::default();

        for record in [huge, empty, enriched_record()] {
            let score = engine.score(&record);
            for sub in [score.growth, score.velocity, score.hidden_gem, score.pioneer] {
                assert!((0.0..=MAX_SCORE).contains(&sub), "{sub} out of range");
            }
        }
    }

    #[test]
    fn overall_is_not_clamped_with_custom_weights() {
        let mut record = enriched_record();
        record.activity.recent_artifacts = Some(10);
        let engine = ScoreEngine::new(ScoringConfig {
            weights: Weights {
                growth: 0.0,
                velocity: 1.2,
                hidden_gem: 0.0,
                pioneer: 0.0,
            },
            ..ScoringConfig::default()
        });

        let score = engine.score(&record);
        assert!(approx(score.velocity, 100.0));
        assert!(approx(score.overall, 120.0));
    }
}
