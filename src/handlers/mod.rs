pub mod achievements;
pub mod auth;
pub mod health;
pub mod journals;
pub mod profiles;
pub mod stats;
