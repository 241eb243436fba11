/// Wishes
///
/// Text wishes (name + message, optional attachment) and video wishes
/// (name + uploaded video), persisted in the document store.

pub mod models;
pub mod store;

pub use models::{VideoWish, Wish, WishKind, WishUpdate};
pub use store::WishStore;
