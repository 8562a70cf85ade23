use sqlx::{Pool, Postgres};

use crate::error::ApiError;
use crate::payload::TagPayload;
use crate::schema::{Tag, Uuid};
use crate::validate::{validate_hex_color, validate_person_name, validate_slug};

pub async fn create_tag(payload: TagPayload, pool: &Pool<Postgres>) -> Result<Tag, ApiError> {
    validate_person_name("name", &payload.name)?;
    validate_hex_color(&payload.color)?;
    validate_slug(&payload.slug)?;

    let tag: Tag =
        sqlx::query_as("INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING *")
            .bind(payload.name)
            .bind(payload.color)
            .bind(payload.slug)
            .fetch_one(pool)
            .await
            .map_err(ApiError::from)?;

    Ok(tag)
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::from)?;

    Ok(tag)
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Uuid>, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::from)?;

    Ok(row.map(|tag| tag.0))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(ApiError::from)?;

    Ok(list)
}

/// Resolves a set of tag ids for the recipe write transaction. Every id must
/// exist; the result keeps the caller's order.
pub async fn resolve_tags(ids: &[Uuid], pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let rows: Vec<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(ApiError::from)?;

    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        match rows.iter().find(|tag| tag.id == *id) {
            Some(tag) => resolved.push(tag.clone()),
            None => {
                return Err(ApiError::validation(
                    "tags",
                    format!("No tag exists with id {id}"),
                ))
            }
        }
    }

    Ok(resolved)
}
