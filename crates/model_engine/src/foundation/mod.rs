//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and bounding volumes
//! - Logging setup

pub mod logging;
pub mod math;
