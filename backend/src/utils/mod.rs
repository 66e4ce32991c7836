pub mod error;
pub mod image_ops;
pub mod qr_encode;
