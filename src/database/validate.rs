use std::collections::HashSet;

use crate::constants::{
    AMOUNT_MAX, AMOUNT_MIN, COLOR_MAX_LENGTH, COOKING_TIME_MAX, COOKING_TIME_MIN, NAME_MAX_LENGTH,
    TEXT_MAX_LENGTH,
};

use super::error::ApiError;
use super::payload::{decode_image, RecipePayload};

/// Person names may contain letters only.
pub fn validate_person_name(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() || value.chars().count() > NAME_MAX_LENGTH {
        return Err(ApiError::validation(field, "Name is empty or too long"));
    }
    if !value.chars().all(char::is_alphabetic) {
        return Err(ApiError::validation(
            field,
            "Name may contain letters only",
        ));
    }
    Ok(())
}

/// Recipe names may contain letters, digits, `-_.()` and whitespace.
pub fn validate_recipe_name(value: &str) -> Result<(), ApiError> {
    if value.is_empty() || value.chars().count() > NAME_MAX_LENGTH {
        return Err(ApiError::validation("name", "Name is empty or too long"));
    }
    let allowed =
        |c: char| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '.' | '(' | ')');
    if !value.chars().all(allowed) {
        return Err(ApiError::validation(
            "name",
            "Name may contain only letters, digits and -_.() characters",
        ));
    }
    Ok(())
}

/// HEX color reference: `#` followed by 3 to 6 hex digits.
pub fn validate_hex_color(value: &str) -> Result<(), ApiError> {
    let digits = match value.strip_prefix('#') {
        Some(digits) => digits,
        None => return Err(ApiError::validation("color", "Color must start with #")),
    };
    if digits.len() < 3 || value.len() > COLOR_MAX_LENGTH {
        return Err(ApiError::validation(
            "color",
            "HEX color must have 3 to 6 digits",
        ));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::validation("color", "Invalid HEX color"));
    }
    Ok(())
}

pub fn validate_slug(value: &str) -> Result<(), ApiError> {
    if value.is_empty() || value.chars().count() > NAME_MAX_LENGTH {
        return Err(ApiError::validation("slug", "Slug is empty or too long"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(ApiError::validation(
            "slug",
            "Slug may contain only ascii letters, digits, - and _",
        ));
    }
    Ok(())
}

pub fn validate_amount(value: i32) -> Result<(), ApiError> {
    if value < AMOUNT_MIN {
        return Err(ApiError::validation(
            "amount",
            format!("Amount must not be less than {AMOUNT_MIN}"),
        ));
    }
    if value > AMOUNT_MAX {
        return Err(ApiError::validation(
            "amount",
            format!("Amount must not be greater than {AMOUNT_MAX}"),
        ));
    }
    Ok(())
}

pub fn validate_cooking_time(value: i32) -> Result<(), ApiError> {
    if value < COOKING_TIME_MIN {
        return Err(ApiError::validation(
            "cooking_time",
            "Cooking time must not be less than a minute",
        ));
    }
    if value > COOKING_TIME_MAX {
        return Err(ApiError::validation(
            "cooking_time",
            "Cooking time must not be longer than a day",
        ));
    }
    Ok(())
}

/// Full pre-transaction validation of a recipe write payload. Everything here
/// must pass before a single row is touched.
pub fn validate_recipe_payload(payload: &RecipePayload) -> Result<(), ApiError> {
    validate_recipe_name(&payload.name)?;

    if payload.text.is_empty() {
        return Err(ApiError::validation("text", "Text must not be empty"));
    }
    if payload.text.chars().count() > TEXT_MAX_LENGTH {
        return Err(ApiError::validation("text", "Text is too long"));
    }

    validate_cooking_time(payload.cooking_time)?;
    decode_image(&payload.image)?;

    if payload.tags.is_empty() {
        return Err(ApiError::validation("tags", "Tag list must not be empty"));
    }
    let unique_tags: HashSet<_> = payload.tags.iter().collect();
    if unique_tags.len() != payload.tags.len() {
        return Err(ApiError::validation("tags", "Tags must be unique"));
    }

    if payload.ingredients.is_empty() {
        return Err(ApiError::validation(
            "ingredients",
            "Ingredient list must not be empty",
        ));
    }
    let unique_ingredients: HashSet<_> = payload.ingredients.iter().map(|line| line.id).collect();
    if unique_ingredients.len() != payload.ingredients.len() {
        return Err(ApiError::validation(
            "ingredients",
            "Ingredients must be unique",
        ));
    }
    for line in payload.ingredients.iter() {
        validate_amount(line.amount)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::IngredientLinePayload;

    fn payload() -> RecipePayload {
        RecipePayload {
            name: String::from("Borscht (classic)"),
            text: String::from("Boil. Serve."),
            cooking_time: 90,
            image: String::from("aGVsbG8="),
            tags: vec![1, 2],
            ingredients: vec![
                IngredientLinePayload { id: 1, amount: 500 },
                IngredientLinePayload { id: 2, amount: 2 },
            ],
        }
    }

    #[test]
    fn accepts_valid_payload() {
        assert!(validate_recipe_payload(&payload()).is_ok());
    }

    #[test]
    fn person_name_is_letters_only() {
        assert!(validate_person_name("first_name", "Olga").is_ok());
        assert!(validate_person_name("first_name", "Ольга").is_ok());
        assert!(validate_person_name("first_name", "Olga7").is_err());
        assert!(validate_person_name("first_name", "O Olga").is_err());
        assert!(validate_person_name("first_name", "").is_err());
    }

    #[test]
    fn recipe_name_policy() {
        assert!(validate_recipe_name("Pasta alla Norma").is_ok());
        assert!(validate_recipe_name("Cake-2.0 (vegan)").is_ok());
        assert!(validate_recipe_name("soup!").is_err());
        assert!(validate_recipe_name("").is_err());
    }

    #[test]
    fn hex_color_policy() {
        assert!(validate_hex_color("#fff").is_ok());
        assert!(validate_hex_color("#E26C2D").is_ok());
        assert!(validate_hex_color("E26C2D").is_err());
        assert!(validate_hex_color("#").is_err());
        assert!(validate_hex_color("#f").is_err());
        assert!(validate_hex_color("#ff").is_err());
        assert!(validate_hex_color("#ggg").is_err());
        assert!(validate_hex_color("#1234567").is_err());
    }

    #[test]
    fn length_caps_count_characters_not_bytes() {
        // Cyrillic letters are two bytes each in UTF-8.
        assert!(validate_person_name("first_name", &"ё".repeat(NAME_MAX_LENGTH)).is_ok());
        assert!(validate_person_name("first_name", &"ё".repeat(NAME_MAX_LENGTH + 1)).is_err());
        assert!(validate_recipe_name(&"щ".repeat(NAME_MAX_LENGTH)).is_ok());
        assert!(validate_recipe_name(&"щ".repeat(NAME_MAX_LENGTH + 1)).is_err());

        let mut p = payload();
        p.text = "ж".repeat(TEXT_MAX_LENGTH);
        assert!(validate_recipe_payload(&p).is_ok());
        p.text.push('ж');
        assert!(validate_recipe_payload(&p).is_err());
    }

    #[test]
    fn amount_bounds_are_inclusive() {
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(100_000).is_ok());
        assert!(validate_amount(100_001).is_err());
    }

    #[test]
    fn cooking_time_bounds_are_inclusive() {
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(1).is_ok());
        assert!(validate_cooking_time(1440).is_ok());
        assert!(validate_cooking_time(1441).is_err());
    }

    #[test]
    fn rejects_empty_tag_list() {
        let mut p = payload();
        p.tags.clear();
        let err = validate_recipe_payload(&p).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation { field: "tags", .. }
        ));
    }

    #[test]
    fn rejects_duplicate_tags() {
        let mut p = payload();
        p.tags = vec![3, 3];
        assert!(validate_recipe_payload(&p).is_err());
    }

    #[test]
    fn rejects_empty_ingredient_list() {
        let mut p = payload();
        p.ingredients.clear();
        let err = validate_recipe_payload(&p).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation {
                field: "ingredients",
                ..
            }
        ));
    }

    #[test]
    fn rejects_duplicate_ingredients() {
        let mut p = payload();
        p.ingredients = vec![
            IngredientLinePayload { id: 5, amount: 10 },
            IngredientLinePayload { id: 5, amount: 20 },
        ];
        assert!(validate_recipe_payload(&p).is_err());
    }

    #[test]
    fn rejects_out_of_range_line_amount() {
        let mut p = payload();
        p.ingredients[0].amount = 100_001;
        let err = validate_recipe_payload(&p).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation { field: "amount", .. }
        ));
    }

    #[test]
    fn rejects_undecodable_image() {
        let mut p = payload();
        p.image = String::from("not base64!!!");
        assert!(validate_recipe_payload(&p).is_err());
    }
}
