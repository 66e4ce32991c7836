use bytes::Bytes;
use image::DynamicImage;
use tracing::debug;

use crate::utils::error::{QrError, WatermarkError};
use crate::utils::image_ops::{composite_center, decode_png, prepare_watermark, target_width, to_png_bytes};
use crate::utils::qr_encode::encode_png;

/// Lebar watermark default relatif terhadap lebar QR code.
pub const DEFAULT_WATERMARK_RATIO: f32 = 0.25;

/// Satu permintaan pembuatan QR code (sudah tervalidasi).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrRequest {
    pub content: String,
    pub size: u32,
    pub watermark: Option<Bytes>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceOptions {
    pub watermark_ratio: f32,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            watermark_ratio: DEFAULT_WATERMARK_RATIO,
        }
    }
}

/// Service tanpa state: setiap panggilan membuat gambar baru sendiri.
#[derive(Debug, Clone, Default)]
pub struct QrService {
    options: ServiceOptions,
}

/* =========================================================
   SINGLE-PURPOSE HELPERS (fungsi tunggal)
   ========================================================= */

fn decode_qr(png: &[u8]) -> Result<image::RgbaImage, WatermarkError> {
    decode_png(png)
        .map(|img| img.to_rgba8())
        .map_err(WatermarkError::DecodeQr)
}

fn encode_final(img: image::RgbaImage) -> Result<Vec<u8>, WatermarkError> {
    to_png_bytes(&DynamicImage::ImageRgba8(img)).map_err(WatermarkError::EncodeFinal)
}

/* =========================================================
   ORCHESTRATOR
   ========================================================= */

impl QrService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ServiceOptions) -> Self {
        Self { options }
    }

    /// QR code polos, PNG grayscale.
    pub fn generate_simple(&self, content: &str, size: u32) -> Result<Vec<u8>, QrError> {
        encode_png(content, size)
    }

    /// QR code dengan watermark di tengah.
    ///
    /// Alur:
    /// 1) `generate_simple(...)` → PNG QR code
    /// 2) `decode_qr(...)` → decode ulang ke bitmap RGBA
    /// 3) `target_width(...)` → lebar watermark = rasio x lebar QR
    /// 4) `prepare_watermark(...)` → decode + resize watermark
    /// 5) `composite_center(...)` → tempel di tengah (source-over)
    /// 6) `encode_final(...)` → encode hasil ke PNG
    pub fn generate_with_watermark(
        &self,
        content: &str,
        size: u32,
        watermark: &[u8],
    ) -> Result<Vec<u8>, QrError> {
        let qr_png = self.generate_simple(content, size)?;
        let base = decode_qr(&qr_png).map_err(QrError::Watermark)?;

        let width = target_width(base.width(), self.options.watermark_ratio);
        let overlay = prepare_watermark(watermark, width, base.height()).map_err(QrError::Watermark)?;
        debug!(
            base = ?base.dimensions(),
            overlay = ?overlay.dimensions(),
            "compositing watermark"
        );

        encode_final(composite_center(&base, &overlay)).map_err(QrError::Watermark)
    }

    /// Dispatch ke `generate_simple` atau `generate_with_watermark`.
    pub fn generate(&self, request: &QrRequest) -> Result<Vec<u8>, QrError> {
        match &request.watermark {
            Some(watermark) => self.generate_with_watermark(&request.content, request.size, watermark),
            None => self.generate_simple(&request.content, request.size),
        }
    }
}
