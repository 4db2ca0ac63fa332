pub mod admission;
pub mod identity;
pub mod jwt;
pub mod middleware;
