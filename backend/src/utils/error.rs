use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;
use thiserror::Error;

/* =========================================================
   DOMAIN ERRORS (layer service & image ops)
   ========================================================= */

/// Kegagalan pada tahap-tahap penambahan watermark.
/// Setiap varian menyebut tahap yang gagal beserta penyebabnya.
/// Penyebab hanya ditulis di pesan, tidak diekspos lagi lewat `source()`.
#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("could not decode QR code: {0}")]
    DecodeQr(image::ImageError),

    #[error("could not decode watermark: {0}")]
    DecodeWatermark(image::ImageError),

    #[error("could not resize the watermark image: {0}")]
    Resize(String),

    #[error("could not encode final image: {0}")]
    EncodeFinal(image::ImageError),
}

/// Error dari `QrService`.
#[derive(Debug, Error)]
pub enum QrError {
    #[error("could not generate a QR code: {0}")]
    Encode(qrcode::types::QrError),

    #[error("could not encode QR code as PNG: {0}")]
    EncodePng(image::ImageError),

    #[error("could not add watermark to QR code: {0}")]
    Watermark(WatermarkError),
}

/* =========================================================
   HTTP BOUNDARY ERROR
   ========================================================= */

#[derive(Debug)]
pub enum AppError {
    /// Input form tidak valid (content / size).
    Validation(String),
    /// Gagal membaca multipart / file watermark.
    Upload(String),
    /// Watermark bukan PNG.
    Format(String),
    /// Gagal membuat QR code (encode / decode / composite).
    Generation(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Upload(_) | Self::Format(_) | Self::Generation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg)
            | Self::Upload(msg)
            | Self::Format(msg)
            | Self::Generation(msg)
            | Self::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Body error berupa JSON string polos, contoh: `"Could not determine the desired QR code size."`
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_string())).into_response()
    }
}
