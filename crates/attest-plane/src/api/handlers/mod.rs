//! API request handlers

pub mod files;
pub mod hello;
pub mod place;

pub use files::serve_file;
pub use hello::{hello, HelloResponse};
pub use place::{place_token, PlaceRequest, PlaceResponse};
