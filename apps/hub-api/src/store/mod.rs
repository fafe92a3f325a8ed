pub mod communities;
pub mod messages;
pub mod users;
