pub const AMOUNT_MIN: i32 = 1;
pub const AMOUNT_MAX: i32 = 100_000;

pub const COOKING_TIME_MIN: i32 = 1;
pub const COOKING_TIME_MAX: i32 = 1440;

pub const NAME_MAX_LENGTH: usize = 200;
pub const TEXT_MAX_LENGTH: usize = 5000;
pub const COLOR_MAX_LENGTH: usize = 7;

pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 100;

pub const SHOPPING_CART_FILE_EXT: &str = "pdf";
