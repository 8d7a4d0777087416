// src/lib.rs
pub mod config;
pub mod matching;
pub mod models;
pub mod utils;
