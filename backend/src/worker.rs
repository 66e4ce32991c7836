use std::{env, fs, path::Path};

use qr_backend::services::qr_service::QrService;
use qr_backend::utils::error::AppError;

/* =========================================================
   SINGLE-PURPOSE HELPERS (fungsi tunggal)
   ========================================================= */

struct WorkerArgs {
    content: String,
    size: u32,
    output: String,
    watermark: Option<String>,
}

/// Parse argumen CLI:
/// qr_worker <content> <size> <output_path> [watermark_path]
fn parse_args(args: Vec<String>) -> Result<WorkerArgs, AppError> {
    let usage = || {
        AppError::Validation(
            "Usage: qr_worker <content> <size> <output_path> [watermark_path]".into(),
        )
    };

    let (content, size, output, watermark) = match args.as_slice() {
        [_bin, content, size, output] => (content, size, output, None),
        [_bin, content, size, output, watermark] => (content, size, output, Some(watermark.clone())),
        _ => return Err(usage()),
    };

    let size = size
        .parse::<u32>()
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| AppError::Validation(format!("Ukuran QR tidak valid: '{size}'")))?;

    (!content.is_empty())
        .then(|| WorkerArgs {
            content: content.clone(),
            size,
            output: output.clone(),
            watermark,
        })
        .ok_or_else(usage)
}

/// Membaca file watermark (jika ada)
fn load_watermark(path: Option<&str>) -> Result<Option<Vec<u8>>, AppError> {
    path.map(|p| {
        fs::read(p).map_err(|e| AppError::Upload(format!("Gagal membuka watermark '{p}': {e}")))
    })
    .transpose()
}

/// Pastikan folder output tersedia sebelum menyimpan file
fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).map_err(|e| {
            AppError::Internal(format!("Gagal membuat folder output '{:?}': {e}", parent))
        }),
        _ => Ok(()),
    }
}

/// Simpan PNG ke output path
fn save_png(png: &[u8], path: &str) -> Result<(), AppError> {
    fs::write(path, png)
        .map_err(|e| AppError::Internal(format!("Gagal menyimpan output image '{path}': {e}")))
}

/* =========================================================
   ORCHESTRATOR
   ========================================================= */

/// Menjalankan workflow worker QR.
///
/// Memanggil:
/// 1) `parse_args(...)` → content, size, output_path, watermark_path
/// 2) `load_watermark(...)` → baca file watermark jika diberikan
/// 3) `QrService` → generate QR (dengan / tanpa watermark)
/// 4) `ensure_parent_dir(...)` → buat folder output jika belum ada
/// 5) `save_png(...)` → simpan hasil ke output_path
fn run() -> Result<(), AppError> {
    let args = parse_args(env::args().collect())?;
    let watermark = load_watermark(args.watermark.as_deref())?;

    let service = QrService::new();
    let png = match &watermark {
        Some(wm) => service.generate_with_watermark(&args.content, args.size, wm),
        None => service.generate_simple(&args.content, args.size),
    }
    .map_err(|e| AppError::Generation(e.to_string()))?;

    ensure_parent_dir(&args.output)?;
    save_png(&png, &args.output)?;

    Ok(())
}

/* =========================================================
   ENTRYPOINT
   ========================================================= */

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
