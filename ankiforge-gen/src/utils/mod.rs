//! Utility modules for ankiforge-gen

pub mod fs;
pub mod retry;
pub mod shutdown;

pub use fs::write_atomic;
pub use retry::{retry_transient, RetryFailure, RetryPolicy, Transient};
pub use shutdown::until_shutdown;
