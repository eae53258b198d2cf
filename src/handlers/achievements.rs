use std::collections::HashMap;

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::gamification::{level_progress, LevelProgress};
use crate::models::achievement::{Achievement, AchievementStatus};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub achievements: Vec<AchievementStatus>,
    pub unlocked_count: usize,
    pub progress: LevelProgress,
}

pub async fn list_achievements(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<AchievementsResponse>> {
    let achievements =
        sqlx::query_as::<_, Achievement>("SELECT * FROM achievements ORDER BY xp_reward ASC")
            .fetch_all(&state.db)
            .await?;

    let unlocks: HashMap<Uuid, DateTime<Utc>> = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
        "SELECT achievement_id, achieved_at FROM user_achievements WHERE user_id = $1",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .collect();

    let xp = sqlx::query_scalar::<_, i32>("SELECT xp FROM profiles WHERE user_id = $1")
        .bind(auth_user.id)
        .fetch_one(&state.db)
        .await?;

    let unlocked_count = unlocks.len();
    let statuses: Vec<AchievementStatus> = achievements
        .into_iter()
        .map(|achievement| {
            let achieved_at = unlocks.get(&achievement.id).copied();
            AchievementStatus {
                unlocked: achieved_at.is_some(),
                achieved_at,
                achievement,
            }
        })
        .collect();

    Ok(Json(AchievementsResponse {
        achievements: statuses,
        unlocked_count,
        progress: level_progress(xp),
    }))
}
