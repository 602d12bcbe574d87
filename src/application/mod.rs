pub mod chat;
pub mod context;
pub mod stock_data;
