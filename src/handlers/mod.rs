pub mod analytics;
pub mod collections;
pub mod entries;
pub mod health;
pub mod moods;
pub mod users;
pub mod ws;
