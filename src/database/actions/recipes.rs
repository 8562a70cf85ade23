use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::constants::RECIPE_COUNT_PER_PAGE;
use crate::error::ApiError;
use crate::pagination::PageContext;
use crate::payload::RecipePayload;
use crate::schema::{Recipe, RecipeFull, RecipeIngredient, RecipeMinified, RecipeRow, Tag, Uuid};
use crate::validate::validate_recipe_payload;

use super::relations::{self, Relation};
use super::{ingredients, tags, users};

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::from)?;

    Ok(row)
}

/// Fetches a recipe for mutation. Only the author may update or delete it.
pub async fn get_recipe_owned(
    id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No recipe exists with specified id"))?;

    if recipe.author_id != author_id {
        return Err(ApiError::permission_denied(
            "Recipe belongs to another author",
        ));
    }

    Ok(recipe)
}

pub async fn fetch_recipes(
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "SELECT r.*, COUNT(*) OVER() FROM recipes r ORDER BY r.pub_date DESC LIMIT $1 OFFSET $2",
    )
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(ApiError::from)?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);

    Ok(page)
}

pub async fn list_recipe_tags(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.* FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY rt.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(ApiError::from)?;

    Ok(list)
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, ApiError> {
    let list: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT ri.ingredient_id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(ApiError::from)?;

    Ok(list)
}

/// Materializes a recipe with its resolved tags, line items, author profile
/// and the viewer's relation flags.
pub async fn get_recipe_full(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeFull, ApiError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("No recipe exists with specified id"))?;

    let tags = list_recipe_tags(id, pool).await?;
    let ingredients = list_recipe_ingredients(id, pool).await?;
    let author = users::profile(recipe.author_id, viewer, pool).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            relations::exists(Relation::Favorite, viewer, id, pool).await?,
            relations::exists(Relation::ShoppingCart, viewer, id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeFull {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

async fn attach_tags(
    recipe_id: Uuid,
    tag_ids: &[Uuid],
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

    query_builder.push_values(tag_ids.iter(), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(tag_id);
    });

    query_builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(ApiError::transaction)?;

    Ok(())
}

async fn attach_ingredients(
    recipe_id: Uuid,
    payload: &RecipePayload,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(payload.ingredients.iter(), |mut b, line| {
        b.push_bind(recipe_id).push_bind(line.id).push_bind(line.amount);
    });

    query_builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(ApiError::transaction)?;

    Ok(())
}

/// Creates a recipe with its tag set and ingredient line items in one
/// transaction. Validation and id resolution happen before the first write;
/// a failure at any later step rolls the whole transaction back.
pub async fn create_recipe(
    author_id: Uuid,
    payload: RecipePayload,
    pool: &Pool<Postgres>,
) -> Result<RecipeFull, ApiError> {
    validate_recipe_payload(&payload)?;
    tags::resolve_tags(&payload.tags, pool).await?;
    ingredients::resolve_ingredients(&payload.ingredients, pool).await?;

    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    let recipe: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&payload.name)
    .bind(&payload.text)
    .bind(&payload.image)
    .bind(payload.cooking_time)
    .fetch_one(&mut *tx)
    .await
    .map_err(ApiError::transaction)?;

    let recipe_id = recipe.0;

    attach_tags(recipe_id, &payload.tags, &mut tx).await?;
    attach_ingredients(recipe_id, &payload, &mut tx).await?;

    tx.commit().await.map_err(ApiError::transaction)?;

    log::info!("created recipe {recipe_id} by user {author_id}");

    get_recipe_full(recipe_id, Some(author_id), pool).await
}

/// Updates a recipe's scalar fields and wholesale-replaces its tag set and
/// line items. The replacement is delete-then-recreate inside one
/// transaction, so concurrent readers never observe a recipe without
/// ingredients and a failed update leaves the prior state intact.
pub async fn update_recipe(
    recipe_id: Uuid,
    author_id: Uuid,
    payload: RecipePayload,
    pool: &Pool<Postgres>,
) -> Result<RecipeFull, ApiError> {
    get_recipe_owned(recipe_id, author_id, pool).await?;

    validate_recipe_payload(&payload)?;
    tags::resolve_tags(&payload.tags, pool).await?;
    ingredients::resolve_ingredients(&payload.ingredients, pool).await?;

    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    sqlx::query(
        "UPDATE recipes SET name = $1, text = $2, image = $3, cooking_time = $4 WHERE id = $5",
    )
    .bind(&payload.name)
    .bind(&payload.text)
    .bind(&payload.image)
    .bind(payload.cooking_time)
    .bind(recipe_id)
    .execute(&mut *tx)
    .await
    .map_err(ApiError::transaction)?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::transaction)?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::transaction)?;

    attach_tags(recipe_id, &payload.tags, &mut tx).await?;
    attach_ingredients(recipe_id, &payload, &mut tx).await?;

    tx.commit().await.map_err(ApiError::transaction)?;

    log::info!("updated recipe {recipe_id}");

    get_recipe_full(recipe_id, Some(author_id), pool).await
}

/// Deletes a recipe together with its line items, tag links and the
/// Favorite/ShoppingCart rows referencing it. Tag and Ingredient catalog
/// rows are never touched.
pub async fn delete_recipe(
    recipe_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    get_recipe_owned(recipe_id, author_id, pool).await?;

    let mut tx = pool.begin().await.map_err(ApiError::from)?;

    for table in ["recipe_ingredients", "recipe_tags", "favorites", "shopping_cart"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = $1"))
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::transaction)?;
    }

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::transaction)?;

    tx.commit().await.map_err(ApiError::transaction)?;

    log::info!("deleted recipe {recipe_id}");

    Ok(())
}

async fn get_recipe_minified(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeMinified, ApiError> {
    let row: Option<RecipeMinified> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(pool)
            .await
            .map_err(ApiError::from)?;

    row.ok_or_else(|| ApiError::not_found("No recipe exists with specified id"))
}

/// ADD half of the favorite toggle. Returns the minified recipe on success.
pub async fn add_favorite(
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeMinified, ApiError> {
    let recipe = get_recipe_minified(recipe_id, pool).await?;
    relations::link(Relation::Favorite, user_id, recipe_id, pool).await?;

    Ok(recipe)
}

pub async fn remove_favorite(
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    relations::unlink(Relation::Favorite, user_id, recipe_id, pool).await
}

/// ADD half of the shopping-cart toggle. Returns the minified recipe on
/// success.
pub async fn add_to_shopping_cart(
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeMinified, ApiError> {
    let recipe = get_recipe_minified(recipe_id, pool).await?;
    relations::link(Relation::ShoppingCart, user_id, recipe_id, pool).await?;

    Ok(recipe)
}

pub async fn remove_from_shopping_cart(
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    relations::unlink(Relation::ShoppingCart, user_id, recipe_id, pool).await
}
