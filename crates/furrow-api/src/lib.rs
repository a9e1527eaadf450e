pub mod auth;
pub mod contacts;
pub mod error;
pub mod messages;
pub mod messaging;
pub mod middleware;
pub mod projector;
pub mod users;
