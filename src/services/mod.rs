pub mod catalog;
pub mod feed;
pub mod library;
pub mod title_search;
