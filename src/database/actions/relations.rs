use sqlx::{Pool, Postgres};

use crate::error::ApiError;
use crate::schema::Uuid;

/// The three user relation tables are structurally identical unique-pair
/// join tables with toggle semantics, so they share one abstraction instead
/// of three copies of the same queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Favorite,
    ShoppingCart,
    Subscription,
}

impl Relation {
    fn table(&self) -> &'static str {
        match self {
            Relation::Favorite => "favorites",
            Relation::ShoppingCart => "shopping_cart",
            Relation::Subscription => "subscriptions",
        }
    }

    fn target_column(&self) -> &'static str {
        match self {
            Relation::Favorite | Relation::ShoppingCart => "recipe_id",
            Relation::Subscription => "author_id",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Relation::Favorite => "favorites",
            Relation::ShoppingCart => "the shopping cart",
            Relation::Subscription => "subscriptions",
        }
    }
}

/// A subscription must never point back at the acting user. Checked before
/// any write; the storage layer repeats it as a CHECK constraint.
pub fn guard_self_reference(
    relation: Relation,
    user_id: Uuid,
    target_id: Uuid,
) -> Result<(), ApiError> {
    if relation == Relation::Subscription && user_id == target_id {
        return Err(ApiError::invalid_operation(
            "Subscribing to yourself is not allowed",
        ));
    }
    Ok(())
}

pub async fn exists(
    relation: Relation,
    user_id: Uuid,
    target_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as(&format!(
        "SELECT user_id FROM {} WHERE user_id = $1 AND {} = $2",
        relation.table(),
        relation.target_column()
    ))
    .bind(user_id)
    .bind(target_id)
    .fetch_optional(pool)
    .await
    .map_err(ApiError::from)?;

    Ok(row.is_some())
}

/// ADD half of the toggle. Creating an already-existing pair is an error,
/// not a no-op; the unique constraint arbitrates concurrent adds so exactly
/// one caller wins.
pub async fn link(
    relation: Relation,
    user_id: Uuid,
    target_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    guard_self_reference(relation, user_id, target_id)?;

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        relation.table(),
        relation.target_column()
    ))
    .bind(user_id)
    .bind(target_id)
    .execute(pool)
    .await
    .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict(format!(
            "Already added to {}",
            relation.describe()
        )));
    }

    log::debug!("linked {:?} ({user_id} -> {target_id})", relation);

    Ok(())
}

/// REMOVE half of the toggle. Removing an absent pair is an error.
pub async fn unlink(
    relation: Relation,
    user_id: Uuid,
    target_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
        relation.table(),
        relation.target_column()
    ))
    .bind(user_id)
    .bind(target_id)
    .execute(pool)
    .await
    .map_err(ApiError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(format!(
            "Not found in {}",
            relation.describe()
        )));
    }

    log::debug!("unlinked {:?} ({user_id} -> {target_id})", relation);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_subscription_is_always_rejected() {
        let err = guard_self_reference(Relation::Subscription, 4, 4).unwrap_err();
        assert!(matches!(err, ApiError::InvalidOperation(_)));
    }

    #[test]
    fn self_reference_is_fine_for_recipe_relations() {
        assert!(guard_self_reference(Relation::Favorite, 4, 4).is_ok());
        assert!(guard_self_reference(Relation::ShoppingCart, 4, 4).is_ok());
        assert!(guard_self_reference(Relation::Subscription, 4, 5).is_ok());
    }

    #[test]
    fn relations_map_to_distinct_tables() {
        assert_eq!(Relation::Favorite.table(), "favorites");
        assert_eq!(Relation::ShoppingCart.table(), "shopping_cart");
        assert_eq!(Relation::Subscription.table(), "subscriptions");
        assert_eq!(Relation::Subscription.target_column(), "author_id");
        assert_eq!(Relation::Favorite.target_column(), "recipe_id");
    }
}
