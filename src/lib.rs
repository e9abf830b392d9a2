// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod storage;
pub mod web;

pub use crate::config::Settings;
pub use crate::core::models::{Grade, HeaderFinding, ScanResult, Section};
pub use crate::core::scanner::Scanner;
pub use crate::error::{Result, ScanError};
