pub mod candidate;
pub mod poll;
pub mod user;
