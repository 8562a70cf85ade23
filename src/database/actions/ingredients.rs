use sqlx::{Pool, Postgres};

use crate::constants::INGREDIENT_COUNT_PER_PAGE;
use crate::error::ApiError;
use crate::pagination::PageContext;
use crate::payload::{IngredientLinePayload, IngredientPayload};
use crate::schema::{Ingredient, Uuid};
use crate::validate::validate_person_name;

#[derive(sqlx::FromRow, Debug, Clone)]
struct IngredientRow {
    id: Uuid,
    name: String,
    measurement_unit: String,
    count: i64,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            measurement_unit: row.measurement_unit,
        }
    }
}

pub async fn create_ingredient(
    payload: IngredientPayload,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, ApiError> {
    validate_person_name("name", &payload.name)?;
    if payload.measurement_unit.is_empty() {
        return Err(ApiError::validation(
            "measurement_unit",
            "Measurement unit must not be empty",
        ));
    }

    let ingredient: Ingredient = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING *",
    )
    .bind(payload.name)
    .bind(payload.measurement_unit)
    .fetch_one(pool)
    .await
    .map_err(ApiError::from)?;

    Ok(ingredient)
}

pub async fn get_ingredient(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::from)?;

    Ok(row)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(ApiError::from)?;

    Ok(rows)
}

/// Escapes the pattern metacharacters so the search term matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Name-prefix search over the catalog, paged.
pub async fn search_ingredients(
    search: &str,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Ingredient>, ApiError> {
    let rows: Vec<IngredientRow> = sqlx::query_as(
        "SELECT i.*, COUNT(*) OVER() FROM ingredients i WHERE i.name ILIKE $1 ORDER BY i.id LIMIT $2 OFFSET $3",
    )
    .bind(format!("{}%", escape_like(search)))
    .bind(INGREDIENT_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(ApiError::from)?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, INGREDIENT_COUNT_PER_PAGE, offset);

    Ok(page.map(Ingredient::from))
}

/// Resolves every `(ingredient_id, amount)` line of a recipe write. Each id
/// must exist in the catalog; the result keeps the caller's order.
pub async fn resolve_ingredients(
    lines: &[IngredientLinePayload],
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let ids: Vec<Uuid> = lines.iter().map(|line| line.id).collect();

    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(pool)
        .await
        .map_err(ApiError::from)?;

    let mut resolved = Vec::with_capacity(ids.len());
    for id in &ids {
        match rows.iter().find(|ingredient| ingredient.id == *id) {
            Some(ingredient) => resolved.push(ingredient.clone()),
            None => {
                return Err(ApiError::validation(
                    "ingredients",
                    format!("No ingredient exists with id {id}"),
                ))
            }
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_terms_match_literally() {
        assert_eq!(escape_like("salt"), "salt");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
