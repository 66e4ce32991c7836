use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::services::qr_service::{ServiceOptions, DEFAULT_WATERMARK_RATIO};

pub const DEFAULT_PORT: u16 = 8080;
/// 10 MiB, batas body multipart.
pub const DEFAULT_BODY_LIMIT: usize = 10 << 20;
pub const DEFAULT_MAX_SIZE: u32 = 4096;

/// Konfigurasi server. Tanpa argumen → `0.0.0.0:8080`.
#[derive(Debug, Clone, Parser)]
#[command(name = "qr_backend", about = "QR code generator HTTP server")]
pub struct ServerConfig {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Sisi maksimum QR code (pixel) yang boleh diminta.
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
    pub max_size: u32,

    #[arg(skip = DEFAULT_BODY_LIMIT)]
    pub body_limit: usize,

    #[arg(skip = DEFAULT_WATERMARK_RATIO)]
    pub watermark_ratio: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_size: DEFAULT_MAX_SIZE,
            body_limit: DEFAULT_BODY_LIMIT,
            watermark_ratio: DEFAULT_WATERMARK_RATIO,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            watermark_ratio: self.watermark_ratio,
        }
    }
}
