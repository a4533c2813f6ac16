//! Value objects - immutable types that represent domain concepts

mod snowflake;
pub mod timestamp;

pub use snowflake::{Snowflake, SnowflakeParseError};
