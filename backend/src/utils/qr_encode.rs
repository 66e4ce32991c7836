use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use qrcode::{Color, EcLevel, QrCode};

use crate::utils::error::QrError;
use crate::utils::image_ops::to_png_bytes;

/// Lebar quiet zone (dalam modul) di setiap sisi simbol.
pub const QUIET_ZONE: u32 = 4;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

// =====================================================================
// PUBLIC API
// =====================================================================

/// Encode `content` menjadi PNG grayscale berukuran `size` x `size`.
///
/// Error-correction level selalu Medium. Jika `size` lebih kecil dari jumlah
/// modul (termasuk quiet zone), gambar yang dihasilkan otomatis lebih besar:
/// satu pixel per modul.
pub fn encode_png(content: &str, size: u32) -> Result<Vec<u8>, QrError> {
    let code = QrCode::with_error_correction_level(content, EcLevel::M).map_err(QrError::Encode)?;
    let bitmap = render(&code, size);

    to_png_bytes(&DynamicImage::ImageLuma8(bitmap)).map_err(QrError::EncodePng)
}

/// Render simbol ke bitmap persegi, simbol diletakkan di tengah.
pub fn render(code: &QrCode, size: u32) -> GrayImage {
    let layout = Layout::new(code.width() as u32, size);

    ImageBuffer::from_fn(layout.side, layout.side, |x, y| {
        match (layout.module_at(x), layout.module_at(y)) {
            (Some(mx), Some(my)) if code[(mx as usize, my as usize)] == Color::Dark => DARK,
            _ => LIGHT,
        }
    })
}

// =====================================================================
// HELPER (PRIVATE)
// =====================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    side: u32,
    pixels_per_module: u32,
    offset: u32,
    symbol_width: u32,
}

impl Layout {
    fn new(symbol_width: u32, size: u32) -> Self {
        let modules = symbol_width + 2 * QUIET_ZONE;

        match size / modules {
            0 => Self {
                side: modules,
                pixels_per_module: 1,
                offset: 0,
                symbol_width,
            },
            ppm => Self {
                side: size,
                pixels_per_module: ppm,
                offset: (size - modules * ppm) / 2,
                symbol_width,
            },
        }
    }

    /// Koordinat modul simbol untuk satu koordinat pixel,
    /// `None` jika pixel jatuh di quiet zone atau margin.
    fn module_at(&self, pixel: u32) -> Option<u32> {
        pixel
            .checked_sub(self.offset)
            .map(|p| p / self.pixels_per_module)
            .and_then(|m| m.checked_sub(QUIET_ZONE))
            .filter(|m| *m < self.symbol_width)
    }
}
