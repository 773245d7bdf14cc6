// Domain layer - Plain data types shared by every other layer
pub mod advisory;
pub mod connection;
pub mod log_entry;
pub mod metric;
