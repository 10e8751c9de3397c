pub mod comments;
pub mod health;
