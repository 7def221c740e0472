//! The `utils` module provides the pieces shared across the `udpsub`
//! application: the error types of every layer and logging set-up.

pub mod error;
pub mod logging;
