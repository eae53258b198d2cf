use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::profile::{Profile, ProfileWithProgress, UpdateProfileRequest};
use crate::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ProfileWithProgress>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Profile not found".into()))?;

    Ok(Json(profile.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileWithProgress>> {
    if let Some(username) = &body.username {
        if username.len() < 3 || username.len() > 30 {
            return Err(AppError::Validation(
                "Username must be 3-30 characters".into(),
            ));
        }

        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM profiles WHERE username = $1 AND user_id <> $2",
        )
        .bind(username)
        .bind(auth_user.id)
        .fetch_one(&state.db)
        .await?;
        if taken > 0 {
            return Err(AppError::Conflict("Username already taken".into()));
        }
    }

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles SET
            username = COALESCE($2, username),
            display_name = COALESCE($3, display_name),
            avatar_url = COALESCE($4, avatar_url),
            email_reminders = COALESCE($5, email_reminders),
            weekly_digest = COALESCE($6, weekly_digest),
            updated_at = NOW()
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(&body.username)
    .bind(&body.display_name)
    .bind(&body.avatar_url)
    .bind(body.email_reminders)
    .bind(body.weekly_digest)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Profile not found".into()))?;

    Ok(Json(profile.into()))
}
