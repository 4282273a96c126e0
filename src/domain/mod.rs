pub mod meeting;
pub mod room;
pub mod schedule;
pub mod token;
pub mod user;
