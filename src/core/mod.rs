pub mod command;
pub mod connectivity;
pub mod feed;
pub mod host;
