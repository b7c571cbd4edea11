#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod board;
pub mod config;
pub mod downlink;
pub mod join;
pub mod payload;
pub mod radio;
pub mod scheduler;
pub mod storage;
pub mod tasks;
pub mod telegram;
pub mod timer;

pub use app::{App, AppConfig};
