use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{info, warn};

use super::AppState;
use crate::services::qr_service::QrRequest;
use crate::utils::error::AppError;
use crate::utils::image_ops::sniff_mime;

const MISSING_CONTENT: &str = "Could not determine the desired QR code content.";
const MISSING_SIZE: &str = "Could not determine the desired QR code size.";

#[derive(Debug, Clone)]
struct RawField {
    name: String,
    file_name: Option<String>,
    data: Bytes,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct FormFields {
    content: Option<String>,
    size: Option<String>,
    watermark: Option<Bytes>,
}

/* =========================================================
   SINGLE-PURPOSE HELPERS (fungsi tunggal)
   ========================================================= */

/// Baca semua field multipart ke memori.
async fn read_fields(mut multipart: Multipart) -> Result<Vec<RawField>, AppError> {
    let mut fields = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(format!("Could not read the multipart form. {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(|e| match name.as_str() {
            "watermark" => AppError::Upload(format!("Could not upload the watermark image. {e}")),
            _ => AppError::Upload(format!("Could not read the form field '{name}'. {e}")),
        })?;

        fields.push(RawField { name, file_name, data });
    }

    Ok(fields)
}

/// Kelompokkan field berdasarkan nama. Field `watermark` hanya dihitung
/// sebagai file jika punya nama file yang tidak kosong.
fn categorize_fields(fields: Vec<RawField>) -> FormFields {
    fields.into_iter().fold(FormFields::default(), |acc, field| {
        let text = || String::from_utf8_lossy(&field.data).into_owned();

        match field.name.as_str() {
            "content" if acc.content.is_none() => FormFields {
                content: Some(text()),
                ..acc
            },
            "size" if acc.size.is_none() => FormFields {
                size: Some(text()),
                ..acc
            },
            "watermark" if acc.watermark.is_none() && has_file_name(&field) => FormFields {
                watermark: Some(field.data.clone()),
                ..acc
            },
            _ => acc,
        }
    })
}

fn has_file_name(field: &RawField) -> bool {
    field.file_name.as_deref().is_some_and(|name| !name.is_empty())
}

fn validate_content(content: Option<String>) -> Result<String, AppError> {
    content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation(MISSING_CONTENT.to_string()))
}

/// Parse `size`. Bukan integer → error "size"; di luar `1..=max_size` → error range.
fn parse_size(size: Option<&str>, max_size: u32) -> Result<u32, AppError> {
    let value = size
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| AppError::Validation(MISSING_SIZE.to_string()))?;

    u32::try_from(value)
        .ok()
        .filter(|v| (1..=max_size).contains(v))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "QR code size must be between 1 and {max_size} pixels."
            ))
        })
}

/// Watermark wajib PNG, dicek dari magic bytes.
fn ensure_png(watermark: &[u8]) -> Result<(), AppError> {
    match sniff_mime(watermark) {
        "image/png" => Ok(()),
        other => Err(AppError::Format(format!(
            "Provided watermark image is {other}, not a PNG."
        ))),
    }
}

fn validate(fields: FormFields, max_size: u32) -> Result<QrRequest, AppError> {
    let content = validate_content(fields.content)?;
    let size = parse_size(fields.size.as_deref(), max_size)?;

    if let Some(watermark) = &fields.watermark {
        ensure_png(watermark)?;
    }

    Ok(QrRequest {
        content,
        size,
        watermark: fields.watermark,
    })
}

fn png_response(png: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], png).into_response()
}

/* =========================================================
   HANDLER
   ========================================================= */

/// `POST /generate`
///
/// 1) `read_fields` + `categorize_fields` → ambil content, size, watermark
/// 2) `validate` → QrRequest
/// 3) `QrService::generate` di thread blocking (CPU-bound)
/// 4) PNG → 200, error apa pun → 400 berisi JSON string
pub async fn generate_qr(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let multipart = multipart
        .map_err(|e| AppError::Upload(format!("Could not read the multipart form. {e}")))?;
    let fields = categorize_fields(read_fields(multipart).await?);

    let request = validate(fields, state.max_size).inspect_err(|e| warn!("rejected request: {e}"))?;
    let has_watermark = request.watermark.is_some();

    let service = state.service.clone();
    let (request, result) = tokio::task::spawn_blocking(move || {
        let result = service.generate(&request);
        (request, result)
    })
    .await
    .map_err(|e| AppError::Internal(format!("QR generation task failed: {e}")))?;

    let png = result
        .map_err(|e| {
            if has_watermark {
                AppError::Generation(format!("Could not generate QR code with the watermark image. {e}"))
            } else {
                AppError::Generation(format!("Could not generate QR code. {e}"))
            }
        })
        .inspect_err(|e| warn!("generation failed: {e}"))?;

    info!(
        size = request.size,
        watermark = has_watermark,
        bytes = png.len(),
        "generated QR code"
    );

    Ok(png_response(png))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, file_name: Option<&str>, data: &[u8]) -> RawField {
        RawField {
            name: name.to_string(),
            file_name: file_name.map(str::to_string),
            data: Bytes::copy_from_slice(data),
        }
    }

    #[test]
    fn categorize_picks_known_fields_and_ignores_others() {
        let fields = categorize_fields(vec![
            field("content", None, b"hello"),
            field("size", None, b"256"),
            field("extra", None, b"ignored"),
            field("watermark", Some("logo.png"), b"\x89PNG"),
        ]);

        assert_eq!(fields.content.as_deref(), Some("hello"));
        assert_eq!(fields.size.as_deref(), Some("256"));
        assert_eq!(fields.watermark.as_deref(), Some(&b"\x89PNG"[..]));
    }

    #[test]
    fn first_value_wins_for_repeated_fields() {
        let fields = categorize_fields(vec![
            field("content", None, b"first"),
            field("content", None, b"second"),
        ]);

        assert_eq!(fields.content.as_deref(), Some("first"));
    }

    #[test]
    fn watermark_without_file_name_counts_as_missing() {
        let fields = categorize_fields(vec![
            field("watermark", None, b"text value"),
            field("watermark", Some(""), b""),
        ]);

        assert_eq!(fields.watermark, None);
    }

    #[test]
    fn empty_content_is_rejected() {
        assert!(matches!(validate_content(Some(String::new())), Err(AppError::Validation(_))));
        assert!(matches!(validate_content(None), Err(AppError::Validation(_))));
        assert_eq!(validate_content(Some("hi".into())).unwrap(), "hi");
    }

    #[test]
    fn size_parsing_boundaries() {
        assert_eq!(parse_size(Some("256"), 4096).unwrap(), 256);
        assert_eq!(parse_size(Some("+12"), 4096).unwrap(), 12);

        let unparseable = parse_size(Some("abc"), 4096).unwrap_err();
        assert_eq!(unparseable.to_string(), MISSING_SIZE);
        assert_eq!(parse_size(None, 4096).unwrap_err().to_string(), MISSING_SIZE);
        assert_eq!(parse_size(Some(""), 4096).unwrap_err().to_string(), MISSING_SIZE);

        for bad in ["0", "-5", "4097", "99999999999"] {
            let err = parse_size(Some(bad), 4096).unwrap_err();
            assert_eq!(err.to_string(), "QR code size must be between 1 and 4096 pixels.");
        }
    }

    #[test]
    fn non_png_watermark_is_a_format_error() {
        let err = ensure_png(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap_err();

        assert!(matches!(err, AppError::Format(_)));
        assert_eq!(err.to_string(), "Provided watermark image is image/jpeg, not a PNG.");
    }

    #[test]
    fn validate_checks_content_before_size() {
        let fields = FormFields {
            content: None,
            size: Some("abc".into()),
            watermark: None,
        };

        assert_eq!(validate(fields, 4096).unwrap_err().to_string(), MISSING_CONTENT);
    }
}
