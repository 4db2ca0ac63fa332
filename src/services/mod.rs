pub mod analytics;
pub mod collections;
pub mod entries;
pub mod images;
pub mod revalidate;
