pub mod feed;
pub mod listener;
