// src/lib.rs

//! Offline archiver for a programming-practice site.
//!
//! Fetches problems, explore cards, company question sets and user
//! submissions through a cached rate-limited API client and assembles
//! them into self-contained HTML documents under one save directory.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
