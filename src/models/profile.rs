use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::gamification::{level_progress, LevelProgress};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub xp: i32,
    pub level: i32,
    pub streak_count: i32,
    pub last_streak_date: Option<NaiveDate>,
    pub email_reminders: bool,
    pub weekly_digest: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProfileWithProgress {
    #[serde(flatten)]
    pub profile: Profile,
    pub progress: LevelProgress,
}

impl From<Profile> for ProfileWithProgress {
    fn from(profile: Profile) -> Self {
        let progress = level_progress(profile.xp);
        Self { profile, progress }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email_reminders: Option<bool>,
    pub weekly_digest: Option<bool>,
}
