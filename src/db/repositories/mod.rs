pub mod cart;
pub mod catalog;
pub mod favorite;
pub mod recipe;
pub mod subscription;
pub mod tag;
pub mod user;
