pub mod connection;
pub mod output;
pub mod request;
