//! Request extractors whose rejections render as `{"detail": ...}`.
//!
//! Use these in place of `axum::Json` and `axum::extract::Path` on input.

use axum::extract::{FromRequest, FromRequestParts};

use super::error::AppError;

/// JSON request body. Rejections keep axum's status (400, 415 or 422).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
