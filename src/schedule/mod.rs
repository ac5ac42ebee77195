// File: ./src/schedule/mod.rs
pub mod months;
pub mod parser;
pub mod tokenizer;

pub use months::MonthTable;
pub use parser::ScheduleParser;
