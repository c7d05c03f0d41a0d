//! Maps weather errors to blockdemo_core::AppError for consistent user-facing messages.

mod weather;

pub use weather::{outcome_to_result, IntoAppError};
