pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod gallery;
pub mod llm;
pub mod storage;
pub mod studio;
pub mod utils;
