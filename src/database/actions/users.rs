use sqlx::{Pool, Postgres};

use crate::error::ApiError;
use crate::payload::UserPayload;
use crate::schema::{RecipeMinified, SubscriptionEntry, User, UserProfile, Uuid};
use crate::validate::validate_person_name;

use super::relations::{self, Relation};

pub async fn get_user(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<User>, ApiError> {
    let row: Option<User> =
        sqlx::query_as("SELECT id, email, username, first_name, last_name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(ApiError::from)?;

    Ok(row)
}

pub async fn get_user_by_email(
    email: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as(
        "SELECT id, email, username, first_name, last_name FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(ApiError::from)?;

    Ok(row)
}

pub async fn register_user(payload: UserPayload, pool: &Pool<Postgres>) -> Result<User, ApiError> {
    validate_person_name("first_name", &payload.first_name)?;
    validate_person_name("last_name", &payload.last_name)?;
    if payload.username.is_empty() {
        return Err(ApiError::validation(
            "username",
            "Username must not be empty",
        ));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::validation("email", "Invalid e-mail address"));
    }

    let user: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, username, first_name, last_name
    ",
    )
    .bind(payload.email)
    .bind(payload.username)
    .bind(payload.first_name)
    .bind(payload.last_name)
    .fetch_one(pool)
    .await
    .map_err(ApiError::from)?;

    log::info!("registered user {} ({})", user.username, user.id);

    Ok(user)
}

/// Public view of a user relative to a viewer. `viewer = None` renders an
/// anonymous view where `is_subscribed` is always false.
pub async fn profile(
    user_id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, ApiError> {
    let user = get_user(user_id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No user exists with specified id"))?;

    let is_subscribed = match viewer {
        Some(viewer) => relations::exists(Relation::Subscription, viewer, user_id, pool).await?,
        None => false,
    };

    Ok(UserProfile::new(user, is_subscribed))
}

/// ADD half of the subscription toggle. Returns the followed author's
/// profile on success.
pub async fn subscribe(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, ApiError> {
    let author = get_user(author_id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No user exists with specified id"))?;

    relations::link(Relation::Subscription, user_id, author_id, pool).await?;

    Ok(UserProfile::new(author, true))
}

pub async fn unsubscribe(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    relations::unlink(Relation::Subscription, user_id, author_id, pool).await
}

/// Authors followed by `user_id`, newest subscription first, each with their
/// recipes (optionally truncated) and the full recipe count.
pub async fn list_subscriptions(
    user_id: Uuid,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<SubscriptionEntry>, ApiError> {
    let authors: Vec<User> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY s.id DESC
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(ApiError::from)?;

    let mut entries = Vec::with_capacity(authors.len());
    for author in authors {
        let recipes: Vec<RecipeMinified> = sqlx::query_as(
            "
            SELECT id, name, image, cooking_time FROM recipes
            WHERE author_id = $1
            ORDER BY pub_date DESC
            LIMIT $2
        ",
        )
        .bind(author.id)
        .bind(recipes_limit.unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await
        .map_err(ApiError::from)?;

        let recipes_count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
                .bind(author.id)
                .fetch_one(pool)
                .await
                .map_err(ApiError::from)?;

        entries.push(SubscriptionEntry {
            author: UserProfile::new(author, true),
            recipes,
            recipes_count: recipes_count.0,
        });
    }

    Ok(entries)
}
