use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Achievement {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub xp_reward: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[allow(dead_code)]
pub struct UserAchievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub achieved_at: DateTime<Utc>,
}

/// One achievement joined with the caller's unlock state.
#[derive(Debug, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub unlocked: bool,
    pub achieved_at: Option<DateTime<Utc>>,
}
