pub mod health;
pub mod news;
