//! Tools the newsletter agents call

pub mod news_search;
pub mod price_history;

pub use news_search::NewsSearchTool;
pub use price_history::PriceHistoryTool;
