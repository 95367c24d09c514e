pub mod common;
pub mod discover;
pub mod info;
pub mod props;
pub mod tables;
