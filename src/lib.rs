// src/lib.rs

//! Vehicle listing scraper and refinement pipeline.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
