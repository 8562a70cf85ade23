use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::error::ApiError;
use crate::schema::{CartLine, ShoppingListItem, Uuid};

/// Folds cart lines into one consolidated quantity list.
///
/// The aggregation key is the display identity `(name, measurement_unit)`,
/// not the ingredient id. Output keeps the insertion order of each key's
/// first occurrence; amounts are summed into `i64`.
pub fn fold_shopping_list(lines: impl IntoIterator<Item = CartLine>) -> Vec<ShoppingListItem> {
    let mut items: Vec<ShoppingListItem> = vec![];
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for line in lines {
        let key = (line.name.clone(), line.measurement_unit.clone());
        match index.get(&key) {
            Some(i) => items[*i].amount += i64::from(line.amount),
            None => {
                index.insert(key, items.len());
                items.push(ShoppingListItem {
                    name: line.name,
                    amount: i64::from(line.amount),
                    measurement_unit: line.measurement_unit,
                });
            }
        }
    }

    items
}

/// Aggregated shopping list for everything in the user's cart. An empty cart
/// yields an empty list.
pub async fn shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>, ApiError> {
    let lines: Vec<CartLine> = sqlx::query_as(
        "
        SELECT i.name, i.measurement_unit, ri.amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        ORDER BY sc.id, ri.id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(ApiError::from)?;

    Ok(fold_shopping_list(lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, amount: i32, unit: &str) -> CartLine {
        CartLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn sums_across_recipes_in_first_occurrence_order() {
        // Recipe A: salt 10 g; recipe B: salt 5 g, sugar 2 g.
        let folded = fold_shopping_list(vec![
            line("Salt", 10, "g"),
            line("Salt", 5, "g"),
            line("Sugar", 2, "g"),
        ]);

        assert_eq!(
            folded,
            vec![
                ShoppingListItem {
                    name: String::from("Salt"),
                    amount: 15,
                    measurement_unit: String::from("g"),
                },
                ShoppingListItem {
                    name: String::from("Sugar"),
                    amount: 2,
                    measurement_unit: String::from("g"),
                },
            ]
        );
    }

    #[test]
    fn empty_cart_yields_empty_list() {
        assert!(fold_shopping_list(vec![]).is_empty());
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let folded = fold_shopping_list(vec![
            line("Milk", 200, "ml"),
            line("Milk", 1, "package"),
            line("Milk", 300, "ml"),
        ]);

        assert_eq!(folded.len(), 2);
        assert_eq!(folded[0].amount, 500);
        assert_eq!(folded[0].measurement_unit, "ml");
        assert_eq!(folded[1].amount, 1);
    }

    #[test]
    fn sums_do_not_overflow_i32() {
        let lines = (0..50_000).map(|_| line("Flour", 100_000, "g"));
        let folded = fold_shopping_list(lines);

        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].amount, 5_000_000_000_i64);
    }

    #[test]
    fn first_occurrence_order_is_kept_over_many_keys() {
        let folded = fold_shopping_list(vec![
            line("Egg", 2, "pc"),
            line("Flour", 500, "g"),
            line("Egg", 4, "pc"),
            line("Butter", 50, "g"),
            line("Flour", 250, "g"),
        ]);

        let names: Vec<&str> = folded.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Egg", "Flour", "Butter"]);
        assert_eq!(folded[0].amount, 6);
        assert_eq!(folded[1].amount, 750);
    }
}
