pub mod completion;
pub mod conversation_store;
pub mod market_data;
