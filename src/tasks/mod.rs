//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry purge: physically removes lazily expired cache entries

mod cleanup;

pub use cleanup::spawn_cleanup_task;
