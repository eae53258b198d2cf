use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::gamification::{self, badges};
use crate::models::achievement::Achievement;
use crate::models::journal::{
    CreateJournalRequest, JournalEntry, JournalQuery, UpdateJournalRequest,
};
use crate::models::profile::Profile;
use crate::AppState;

const MAX_TAGS: usize = 20;
const MAX_TAG_LEN: usize = 50;

/// Create response: the stored entry plus everything the write triggered.
#[derive(Debug, serde::Serialize)]
pub struct CreateJournalResponse {
    #[serde(flatten)]
    pub entry: JournalEntry,
    pub xp_awarded: i32,
    pub streak_count: i32,
    pub level: i32,
    pub unlocked_achievements: Vec<Achievement>,
}

pub async fn list_journals(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<JournalQuery>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let journals = sqlx::query_as::<_, JournalEntry>(
        r#"
        SELECT * FROM journals
        WHERE user_id = $1
          AND ($2::mood IS NULL OR mood = $2)
          AND ($3::text IS NULL OR $3 = ANY(tags))
          AND ($4::date IS NULL OR created_at::date >= $4)
          AND ($5::date IS NULL OR created_at::date <= $5)
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(query.mood)
    .bind(&query.tag)
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(journals))
}

pub async fn get_journal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(journal_id): Path<Uuid>,
) -> AppResult<Json<JournalEntry>> {
    let journal = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journals WHERE id = $1 AND user_id = $2",
    )
    .bind(journal_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Journal not found".into()))?;

    Ok(Json(journal))
}

pub async fn create_journal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateJournalRequest>,
) -> AppResult<Json<CreateJournalResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if body.tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "At most {} tags per entry",
            MAX_TAGS
        )));
    }
    if body
        .tags
        .iter()
        .any(|t| t.is_empty() || t.len() > MAX_TAG_LEN)
    {
        return Err(AppError::Validation(format!(
            "Tags must be 1-{} characters",
            MAX_TAG_LEN
        )));
    }

    let entry_xp = gamification::entry_xp(&body.content, body.tags.len());

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        INSERT INTO journals (id, user_id, title, content, mood, tags, is_private, xp_earned)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.content)
    .bind(body.mood)
    .bind(&body.tags)
    .bind(body.is_private.unwrap_or(true))
    .bind(entry_xp)
    .fetch_one(&state.db)
    .await?;

    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(auth_user.id)
        .fetch_one(&state.db)
        .await?;

    let today = Utc::now().date_naive();
    let streak_count =
        gamification::advance_streak(today, profile.last_streak_date, profile.streak_count);

    let unlocked = check_achievements(&state, &entry, streak_count).await?;
    let bonus_xp: i32 = unlocked.iter().map(|a| a.xp_reward).sum();

    let new_xp = profile.xp + entry_xp + bonus_xp;
    let new_level = gamification::level_for_xp(new_xp);
    if new_level > profile.level {
        tracing::info!(user_id = %auth_user.id, level = new_level, "Level up");
    }

    sqlx::query(
        r#"
        UPDATE profiles SET
            xp = $2,
            level = $3,
            streak_count = $4,
            last_streak_date = $5,
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(auth_user.id)
    .bind(new_xp)
    .bind(new_level)
    .bind(streak_count)
    .bind(today)
    .execute(&state.db)
    .await?;

    Ok(Json(CreateJournalResponse {
        entry,
        xp_awarded: entry_xp + bonus_xp,
        streak_count,
        level: new_level,
        unlocked_achievements: unlocked,
    }))
}

pub async fn update_journal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(journal_id): Path<Uuid>,
    Json(body): Json<UpdateJournalRequest>,
) -> AppResult<Json<JournalEntry>> {
    if let Some(title) = &body.title {
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".into()));
        }
    }
    if let Some(tags) = &body.tags {
        if tags.len() > MAX_TAGS {
            return Err(AppError::Validation(format!(
                "At most {} tags per entry",
                MAX_TAGS
            )));
        }
    }

    // Edits never re-award XP or touch the streak
    let journal = sqlx::query_as::<_, JournalEntry>(
        r#"
        UPDATE journals SET
            title = COALESCE($3, title),
            content = COALESCE($4, content),
            mood = COALESCE($5, mood),
            tags = COALESCE($6, tags),
            is_private = COALESCE($7, is_private),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(journal_id)
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(&body.content)
    .bind(body.mood)
    .bind(&body.tags)
    .bind(body.is_private)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Journal not found".into()))?;

    Ok(Json(journal))
}

pub async fn delete_journal(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(journal_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM journals WHERE id = $1 AND user_id = $2")
        .bind(journal_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Journal not found".into()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Evaluate every unlock rule against the post-insert state and award what
/// newly applies. Returns the achievements unlocked by this entry.
async fn check_achievements(
    state: &AppState,
    entry: &JournalEntry,
    streak_count: i32,
) -> AppResult<Vec<Achievement>> {
    let entry_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM journals WHERE user_id = $1",
    )
    .bind(entry.user_id)
    .fetch_one(&state.db)
    .await?;

    let distinct_tags = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(DISTINCT t.tag)
        FROM journals j CROSS JOIN LATERAL unnest(j.tags) AS t(tag)
        WHERE j.user_id = $1
        "#,
    )
    .bind(entry.user_id)
    .fetch_one(&state.db)
    .await?;

    let mut candidates: Vec<&str> = Vec::new();
    if entry_count == 1 {
        candidates.push(badges::FIRST_JOURNAL);
    }
    if streak_count >= 3 {
        candidates.push(badges::STREAK_3);
    }
    if streak_count >= 7 {
        candidates.push(badges::STREAK_7);
    }
    if entry.mood.is_some() {
        candidates.push(badges::MOOD_TRACKER);
    }
    if distinct_tags >= badges::TAG_MASTER_THRESHOLD {
        candidates.push(badges::TAG_MASTER);
    }
    if gamification::word_count(&entry.content) > badges::WORDSMITH_THRESHOLD {
        candidates.push(badges::WORDSMITH);
    }

    let mut unlocked = Vec::new();
    for name in candidates {
        if let Some(achievement) = award_achievement(state, entry.user_id, name).await? {
            unlocked.push(achievement);
        }
    }
    Ok(unlocked)
}

/// Idempotent award: the UNIQUE (user_id, achievement_id) constraint plus
/// ON CONFLICT DO NOTHING make re-triggered conditions a no-op, and XP is
/// only granted when the insert actually lands.
async fn award_achievement(
    state: &AppState,
    user_id: Uuid,
    name: &str,
) -> AppResult<Option<Achievement>> {
    let achievement =
        sqlx::query_as::<_, Achievement>("SELECT * FROM achievements WHERE name = $1")
            .bind(name)
            .fetch_optional(&state.db)
            .await?;

    let Some(achievement) = achievement else {
        tracing::warn!(name = %name, "Achievement missing from reference data");
        return Ok(None);
    };

    let result = sqlx::query(
        r#"
        INSERT INTO user_achievements (id, user_id, achievement_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, achievement_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(achievement.id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    tracing::info!(user_id = %user_id, achievement = %achievement.name, "Achievement unlocked");
    Ok(Some(achievement))
}
