use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

use super::error::ApiError;
use super::schema::Uuid;

/// Request body of `POST /recipes/` and `PATCH /recipes/{id}/`.
#[derive(Deserialize, Debug, Clone)]
pub struct RecipePayload {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientLinePayload>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct IngredientLinePayload {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TagPayload {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct IngredientPayload {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserPayload {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Decodes a base64 image payload, with or without a `data:` URL prefix.
/// Storage of the decoded bytes is left to the caller.
pub fn decode_image(value: &str) -> Result<Vec<u8>, ApiError> {
    if value.is_empty() {
        return Err(ApiError::validation("image", "Image must not be empty"));
    }
    let encoded = match value.split_once(";base64,") {
        Some((_, encoded)) => encoded,
        None => value,
    };
    STANDARD
        .decode(encoded)
        .map_err(|e| ApiError::validation("image", format!("Invalid base64 image: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recipe_body() {
        let body = serde_json::json!({
            "name": "Pancakes",
            "text": "Mix and fry.",
            "cooking_time": 20,
            "image": "aGVsbG8=",
            "tags": [1, 3],
            "ingredients": [{"id": 7, "amount": 200}, {"id": 9, "amount": 2}],
        });
        let payload: RecipePayload = serde_json::from_value(body).unwrap();

        assert_eq!(payload.tags, vec![1, 3]);
        assert_eq!(payload.ingredients.len(), 2);
        assert_eq!(payload.ingredients[0].id, 7);
        assert_eq!(payload.ingredients[0].amount, 200);
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let body = serde_json::json!({
            "name": "Pancakes",
            "cooking_time": 20,
            "image": "aGVsbG8=",
            "tags": [1],
            "ingredients": [{"id": 7, "amount": 200}],
        });
        assert!(serde_json::from_value::<RecipePayload>(body).is_err());
    }

    #[test]
    fn decodes_plain_base64() {
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn decodes_data_url() {
        let decoded = decode_image("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_image("@@@").is_err());
        assert!(decode_image("").is_err());
    }
}
