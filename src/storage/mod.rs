pub mod db;
pub mod error;
pub mod operations;
pub mod query;
pub(crate) mod schema;
