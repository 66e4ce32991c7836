use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, ImageFormat, ImageResult, Rgba, RgbaImage};

use crate::utils::error::WatermarkError;

// =====================================================================
// PUBLIC PURE API
// =====================================================================
// - Pure function, tidak ada state global
// - Deterministic: input sama → output sama
// - Input tidak pernah dimutasi, selalu alokasi canvas baru
// =====================================================================

/// Decode watermark PNG lalu resize ke lebar `target_width`.
/// Tinggi mengikuti rasio aspek gambar asli, dibatasi ke `1..=max_height`
/// (tinggi canvas tujuan) sehingga tidak pernah mengalokasikan pixel
/// yang pasti terpotong.
pub fn prepare_watermark(
    raw: &[u8],
    target_width: u32,
    max_height: u32,
) -> Result<RgbaImage, WatermarkError> {
    let decoded = decode_png(raw).map_err(WatermarkError::DecodeWatermark)?;

    (target_width > 0)
        .then(|| resize_to_width(&decoded, target_width, max_height))
        .ok_or_else(|| WatermarkError::Resize("target width is zero".to_string()))
}

/// Tempel `overlay` tepat di tengah `base`.
pub fn composite_center(base: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    let offset = center_offset(base.dimensions(), overlay.dimensions());
    composite_at(base, overlay, offset)
}

/// Gambar `base` (opaque) ke canvas baru, lalu `overlay` di atasnya dengan
/// source-over pada `offset`. Pixel overlay di luar canvas dipotong.
pub fn composite_at(base: &RgbaImage, overlay: &RgbaImage, offset: (i64, i64)) -> RgbaImage {
    let (bw, bh) = base.dimensions();

    ImageBuffer::from_fn(bw, bh, |x, y| {
        let base_px = *base.get_pixel(x, y);

        overlay_pixel(overlay, offset, x, y)
            .map(|src| source_over(src, base_px))
            .unwrap_or(base_px)
    })
}

/// Lebar watermark sebagai fraksi lebar QR (dibulatkan ke bawah).
pub fn target_width(base_width: u32, ratio: f32) -> u32 {
    (base_width as f64 * ratio as f64).floor() as u32
}

/// Offset tengah per sumbu: `base/2 - overlay/2` (pembagian integer).
pub fn center_offset((bw, bh): (u32, u32), (ow, oh): (u32, u32)) -> (i64, i64) {
    (
        i64::from(bw / 2) - i64::from(ow / 2),
        i64::from(bh / 2) - i64::from(oh / 2),
    )
}

pub fn decode_png(raw: &[u8]) -> ImageResult<DynamicImage> {
    image::load_from_memory_with_format(raw, ImageFormat::Png)
}

pub fn to_png_bytes(img: &DynamicImage) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Deteksi MIME type dari magic bytes, fallback `application/octet-stream`.
pub fn sniff_mime(raw: &[u8]) -> &'static str {
    image::guess_format(raw)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

//
// =====================================================================
// HELPER PURE FUNCTIONS (PRIVATE)
// =====================================================================
//

// -----------------------------------------------------
// Resize proporsional (Lanczos3, deterministik)
// -----------------------------------------------------
fn resize_to_width(img: &DynamicImage, width: u32, max_height: u32) -> RgbaImage {
    let height = scaled_height(img.width(), img.height(), width, max_height);
    image::imageops::resize(&img.to_rgba8(), width, height, FilterType::Lanczos3)
}

// clamp dilakukan di f64, sebelum cast ke u32
fn scaled_height(src_width: u32, src_height: u32, width: u32, max_height: u32) -> u32 {
    let height = (src_height as f64 * width as f64 / src_width.max(1) as f64).round();
    height.clamp(1.0, max_height.max(1) as f64) as u32
}

// -----------------------------------------------------
// Ambil pixel overlay yang menutupi (x, y) di canvas
// -----------------------------------------------------
fn overlay_pixel(overlay: &RgbaImage, (ox, oy): (i64, i64), x: u32, y: u32) -> Option<Rgba<u8>> {
    let (ow, oh) = overlay.dimensions();
    let lx = i64::from(x) - ox;
    let ly = i64::from(y) - oy;

    let is_inside = lx >= 0 && ly >= 0 && lx < i64::from(ow) && ly < i64::from(oh);

    is_inside.then(|| *overlay.get_pixel(lx as u32, ly as u32))
}

// -----------------------------------------------------
// Source-over untuk RGBA straight alpha
// -----------------------------------------------------
fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as f32 / 255.0;
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let c = (src.0[i] as f32 * sa + dst.0[i] as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round() as u8,
    ])
}
