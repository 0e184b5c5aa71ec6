pub mod catalog;
pub use catalog::CatalogLoader;

pub mod image;
pub use image::ImageService;

pub mod pluralize;

pub mod recipe_service;
pub use recipe_service::{
    IngredientAmount, RecipeError, RecipeInput, RecipeListPage, RecipeListQuery, RecipeService,
};

pub mod recipe_service_impl;
pub use recipe_service_impl::SeaOrmRecipeService;

pub mod shopping_list;
pub use shopping_list::{CartError, RenderedList, ShoppingListService};
