use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub mood: Option<Mood>,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub xp_earned: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "mood", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Excited,
    Calm,
    Anxious,
    Neutral,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Excited => "excited",
            Mood::Calm => "calm",
            Mood::Anxious => "anxious",
            Mood::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJournalRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub mood: Option<Mood>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJournalRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub tags: Option<Vec<String>>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    pub mood: Option<Mood>,
    pub tag: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
