//! Analytics and gamification reads.

use super::client::ApiClient;
use super::errors::ApiResult;
use super::models::{
    Achievements, AnalyticsScope, BatchAnalytics, GamificationProfile, GamificationStats,
    Leaderboard, TestResultRecord, Timeframe, TopicAverage,
};
use reqwest::Method;
use serde_json::Value;

/// Leaderboard size when the caller does not ask for one
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 100;

impl ApiClient {
    /// Finished tests of the logged-in student
    pub async fn my_results(&self) -> ApiResult<Vec<TestResultRecord>> {
        self.get("/data/my-results").await
    }

    pub async fn my_topic_averages(&self) -> ApiResult<Vec<TopicAverage>> {
        self.get("/data/my-topic-averages").await
    }

    /// Cohort averages; staff only
    pub async fn batch_analytics(&self, scope: &AnalyticsScope) -> ApiResult<BatchAnalytics> {
        self.call(Method::GET, "/data/batch-analytics", |b| b.query(scope))
            .await
    }

    /// Per-student rows for staff dashboards, passed through untyped
    pub async fn student_stats(&self, scope: &AnalyticsScope) -> ApiResult<Vec<Value>> {
        let stats: Option<Vec<Value>> = self
            .call(Method::GET, "/data/student-stats", |b| b.query(scope))
            .await?;
        Ok(stats.unwrap_or_default())
    }

    pub async fn skill_gaps(&self) -> ApiResult<Value> {
        self.get("/data/skill-gaps").await
    }

    pub async fn recommendations(&self) -> ApiResult<Value> {
        self.get("/data/recommendations").await
    }

    pub async fn gamification_profile(&self) -> ApiResult<GamificationProfile> {
        self.get("/gamification/profile").await
    }

    pub async fn leaderboard(&self, timeframe: Timeframe, limit: Option<u32>) -> ApiResult<Leaderboard> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT).max(1);
        self.call(Method::GET, "/gamification/leaderboard", |b| {
            b.query(&[("timeframe", timeframe.as_str())])
                .query(&[("limit", limit)])
        })
        .await
    }

    pub async fn achievements(&self) -> ApiResult<Achievements> {
        self.get("/gamification/achievements").await
    }

    pub async fn gamification_stats(&self) -> ApiResult<GamificationStats> {
        self.get("/gamification/stats").await
    }
}
