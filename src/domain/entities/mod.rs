pub mod bar;
pub mod fundamentals;
pub mod quote;
pub mod turn;
