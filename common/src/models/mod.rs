//! Shared data models.

pub mod connection;
pub mod row;

// Re-export commonly used types
pub use connection::{ConnectionConfig, DbType};
pub use row::{ResultSet, Row, ScalarValue};
