//! Data models for Bookshelf

pub mod book;
pub mod session;
pub mod user;

pub use book::{Book, BookQuery, BookStatus, CreateBook, DeleteBook, UpdateBook};
pub use session::{AuthEvent, AuthSession, Session};
pub use user::User;
