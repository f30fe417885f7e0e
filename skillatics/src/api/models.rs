//! Request and response bodies for the learning, admin, analytics and
//! gamification endpoints.
//!
//! Flow-specific bodies live beside their flows ([`crate::test_session`],
//! [`crate::coding`]); auth bodies live in [`crate::auth::models`].

use crate::auth::User;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Category a learning topic is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopicCategory {
    #[serde(rename = "General Aptitude")]
    GeneralAptitude,
    #[serde(rename = "Technical Aptitude")]
    TechnicalAptitude,
}

impl TopicCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            TopicCategory::GeneralAptitude => "General Aptitude",
            TopicCategory::TechnicalAptitude => "Technical Aptitude",
        }
    }
}

impl fmt::Display for TopicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "general aptitude" | "aptitude" => Ok(TopicCategory::GeneralAptitude),
            "technical" | "technical aptitude" => Ok(TopicCategory::TechnicalAptitude),
            other => Err(format!("unknown topic category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: TopicCategory,
    #[serde(default)]
    pub theory: String,
    #[serde(default)]
    pub shortcuts: String,
}

/// Student-facing topic listing, split by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCatalog {
    #[serde(default)]
    pub general_aptitude: Vec<Topic>,
    #[serde(default)]
    pub technical_aptitude: Vec<Topic>,
}

impl TopicCatalog {
    pub fn len(&self) -> usize {
        self.general_aptitude.len() + self.technical_aptitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: &str) -> Option<&Topic> {
        self.general_aptitude
            .iter()
            .chain(&self.technical_aptitude)
            .find(|t| t.id == id)
    }
}

/// Body for creating or replacing a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicDraft {
    pub name: String,
    pub category: TopicCategory,
    pub theory: String,
    pub shortcuts: String,
}

impl TopicDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Topic name is required".to_string());
        }
        Ok(())
    }
}

/// Practice question attached to a learning topic; the answer is shown
/// after the student picks an option
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PracticeQuestion {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl PracticeQuestion {
    /// `None` when the backend withheld the answer
    pub fn is_correct(&self, option: &str) -> Option<bool> {
        self.answer.as_deref().map(|answer| answer == option)
    }
}

/// Question bank an MCQ belongs to, as the create endpoint names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionCategory {
    Aptitude,
    Technical,
}

impl FromStr for QuestionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aptitude" | "general" | "general aptitude" => Ok(QuestionCategory::Aptitude),
            "technical" | "technical aptitude" => Ok(QuestionCategory::Technical),
            other => Err(format!("unknown question type '{other}'")),
        }
    }
}

/// `POST /admin/questions` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewQuestion {
    pub text: String,
    pub topic: String,
    pub difficulty: u8,
    #[serde(rename = "type")]
    pub category: QuestionCategory,
    pub options: Vec<String>,
    pub answer: String,
}

impl NewQuestion {
    /// Build from form input where options are separated by `|`
    pub fn from_form(
        text: &str,
        topic: &str,
        difficulty: u8,
        category: QuestionCategory,
        options: &str,
        answer: &str,
    ) -> Self {
        Self {
            text: text.trim().to_string(),
            topic: topic.trim().to_string(),
            difficulty,
            category,
            options: options
                .split('|')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            answer: answer.trim().to_string(),
        }
    }

    /// # Errors
    ///
    /// A message naming the first field the question form would refuse
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("Question text is required".to_string());
        }
        if self.topic.trim().is_empty() {
            return Err("Topic is required".to_string());
        }
        if !(1..=5).contains(&self.difficulty) {
            return Err("Difficulty must be between 1 and 5".to_string());
        }
        if self.options.len() < 2 {
            return Err("At least two options are required".to_string());
        }
        if !self.options.contains(&self.answer) {
            return Err("Answer must be one of the options".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedId {
    #[serde(rename = "_id")]
    pub id: String,
}

/// Result of a CSV bulk import
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CsvImportReport {
    #[serde(default)]
    pub inserted: u32,
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// `POST /admin/generate-questions` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateQuestions {
    pub topic: String,
    pub difficulty: u8,
    pub count: u32,
}

impl GenerateQuestions {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            difficulty: 3,
            count: 5,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.topic.trim().is_empty() {
            return Err("Topic is required".to_string());
        }
        if !(1..=5).contains(&self.difficulty) {
            return Err("Difficulty must be between 1 and 5".to_string());
        }
        if self.count == 0 {
            return Err("Count must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateReport {
    #[serde(default)]
    pub generated: u32,
}

/// `POST /auth/update-profile` reply; the backend may echo the refreshed
/// user and a reissued token
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
}

/// One finished adaptive test
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub correct_questions: u32,
    #[serde(default)]
    pub adaptive_path: Vec<u8>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default, rename = "type")]
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAverage {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub avg_score: f64,
    #[serde(default)]
    pub tests: u32,
}

/// Cohort-wide averages for staff dashboards
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAnalytics {
    #[serde(default)]
    pub avg_score: f64,
    #[serde(default)]
    pub tests: u32,
    #[serde(default)]
    pub avg_correct: f64,
    #[serde(default)]
    pub avg_total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeLevel {
    College,
    Department,
    Division,
}

/// Query narrowing staff analytics to part of the cohort
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
}

impl AnalyticsScope {
    pub fn college() -> Self {
        Self {
            scope: Some(ScopeLevel::College),
            ..Self::default()
        }
    }

    pub fn department(department: impl Into<String>) -> Self {
        Self {
            scope: Some(ScopeLevel::Department),
            department: Some(department.into()),
            division: None,
        }
    }

    pub fn division(department: impl Into<String>, division: impl Into<String>) -> Self {
        Self {
            scope: Some(ScopeLevel::Division),
            department: Some(department.into()),
            division: Some(division.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GamificationProfile {
    #[serde(default)]
    pub xp: i64,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub xp_progress: i64,
    #[serde(default)]
    pub xp_needed: i64,
    #[serde(default)]
    pub progress_percentage: u32,
}

fn first_level() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    All,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub const fn as_str(self) -> &'static str {
        match self {
            Timeframe::All => "all",
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Timeframe::All),
            "weekly" | "week" => Ok(Timeframe::Weekly),
            "monthly" | "month" => Ok(Timeframe::Monthly),
            other => Err(format!("unknown timeframe '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub xp: i64,
    #[serde(default = "first_level")]
    pub level: u32,
    /// Number of badges earned
    #[serde(default)]
    pub badges: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Leaderboard {
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub user_rank: Option<u32>,
    #[serde(default)]
    pub user_entry: Option<LeaderboardEntry>,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub total_users: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub xp_bonus: i64,
    #[serde(default)]
    pub earned: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Achievements {
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub earned_count: u32,
    #[serde(default)]
    pub total_count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct GamificationStats {
    #[serde(default)]
    pub total_xp_distributed: i64,
    #[serde(default)]
    pub average_level: f64,
    #[serde(default)]
    pub total_badges_earned: u32,
    #[serde(default)]
    pub total_achievements: u32,
}

/// Admin user listing entry; the backend returns raw user documents, so
/// anything past the profile fields is kept verbatim
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}
