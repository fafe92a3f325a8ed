pub mod id;
pub mod slug;
pub mod snowflake;
pub mod wire;

pub use slug::normalize_slug;
pub use snowflake::SnowflakeGenerator;
