pub mod achievement;
pub mod journal;
pub mod profile;
pub mod user;
