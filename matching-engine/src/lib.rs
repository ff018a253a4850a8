mod matcher;
mod order_book;
mod price_level;
mod side_index;
pub mod config;
pub mod engine;

pub use config::EngineConfig;
pub use engine::{Engine, EngineService, Request};
pub use order_book::{OrderBook, SubmitResult};
pub use price_level::PriceLevel;
pub use side_index::SideIndex;
