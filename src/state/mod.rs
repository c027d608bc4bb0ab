/// State management module
///
/// This module handles the per-interaction state:
/// - Shared data structures (data.rs)
/// - Temp file lifecycle for uploaded images (upload.rs)
/// - Replacement parameters and descriptor building (request.rs)

pub mod data;
pub mod request;
pub mod upload;
