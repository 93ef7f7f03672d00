pub mod request_tracing;
pub mod tenant;
