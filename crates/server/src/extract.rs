//! `Json` and `Path` extractors whose rejections use the `ApiResponse` envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// Like [`axum::Json`], but a body that does not deserialize is a 400 `ApiError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Like [`axum::extract::Path`], but a malformed segment is a 400 `ApiError`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
