pub mod auth;
pub mod policies;
pub mod roles;
pub mod system;
pub mod users;
