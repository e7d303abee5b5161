pub mod assignments;
pub mod auth;
pub mod avatars;
pub mod exercises;
pub mod health;
pub mod sessions;
pub mod stats;
pub mod users;
pub mod workouts;
