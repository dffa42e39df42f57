pub mod admin;
pub mod health;
pub mod messages;
pub mod student;
pub mod teacher;
pub mod users;
pub mod utils;
