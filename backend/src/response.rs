//! Success response envelope

use serde::Serialize;

/// Standard `{ok: true, data}` envelope wrapping every successful response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope for operations with no payload (e.g. deletes)
    pub fn empty() -> Self {
        Self {
            ok: true,
            data: None,
        }
    }
}
