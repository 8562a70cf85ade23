mod database {
    pub mod actions;
    pub mod error;
    pub mod pagination;
    pub mod payload;
    pub mod schema;
    pub mod validate;
}
mod export {
    pub mod pdf;
}
mod constants;

pub use constants::*;
pub use database::*;
pub use export::pdf::ShoppingListDocument;
