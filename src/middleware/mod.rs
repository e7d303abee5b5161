pub mod auth;

pub use auth::{AdminUser, AuthUser, StaffUser};
