// src/lib.rs

//! Snapshill: archives links posted to a feed and replies with the snapshots.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
