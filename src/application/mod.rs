//! Page controllers, session state and the seams to the blog API.

pub mod admin;
pub mod content;
pub mod error;
pub mod repos;
pub mod resource;
pub mod session;
pub mod stream;
pub mod toasts;
