//! QR code rasterisation.

use image::{Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};

use super::color::{BLACK, TRANSPARENT, WHITE};
use super::surface::MAX_PIXELS;
use crate::error::CertifyError;

/// How a QR element is encoded and painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrOptions {
    /// Output edge length in pixels.
    pub size: u32,
    /// Quiet zone width in modules.
    pub margin: u32,
    pub ec_level: EcLevel,
    pub foreground: Rgba<u8>,
    pub transparent_background: bool,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 200,
            margin: 1,
            ec_level: EcLevel::M,
            foreground: BLACK,
            transparent_background: true,
        }
    }
}

/// Encode `data` into a square `options.size` bitmap.
///
/// Modules are mapped nearest-neighbour so edges stay sharp at any size.
pub fn encode_qr(data: &str, options: &QrOptions) -> Result<RgbaImage, CertifyError> {
    let size = options.size.max(1);
    if u64::from(size) * u64::from(size) > MAX_PIXELS {
        return Err(CertifyError::Qr(format!("QR bitmap {}x{} is too large", size, size)));
    }
    let code = QrCode::with_error_correction_level(data, options.ec_level)
        .map_err(|e| CertifyError::Qr(format!("QR code generation failed: {}", e)))?;

    let modules = code.width() as u32;
    let total = modules + 2 * options.margin;
    let background = if options.transparent_background {
        TRANSPARENT
    } else {
        WHITE
    };

    Ok(RgbaImage::from_fn(size, size, |x, y| {
        let qx = (u64::from(x) * u64::from(total) / u64::from(size)) as u32;
        let qy = (u64::from(y) * u64::from(total) / u64::from(size)) as u32;
        let inside = |v: u32| v >= options.margin && v < options.margin + modules;
        if inside(qx) && inside(qy) {
            let module = (
                (qx - options.margin) as usize,
                (qy - options.margin) as usize,
            );
            if code[module] == qrcode::Color::Dark {
                return options.foreground;
            }
        }
        background
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(size: u32) -> QrOptions {
        QrOptions {
            size,
            ..QrOptions::default()
        }
    }

    #[test]
    fn test_output_is_requested_size() {
        let image = encode_qr("https://example.com/cert/42", &sized(150)).unwrap();
        assert_eq!(image.dimensions(), (150, 150));
    }

    #[test]
    fn test_quiet_zone_is_transparent() {
        // Version 1 is 21 modules; with a margin of 1 the grid is 23 wide.
        let image = encode_qr("A", &sized(230)).unwrap();
        assert_eq!(*image.get_pixel(0, 0), TRANSPARENT);
        assert_eq!(*image.get_pixel(5, 115), TRANSPARENT);
        // Top-left finder pattern starts right after the quiet zone.
        assert_eq!(*image.get_pixel(15, 15), BLACK);
    }

    #[test]
    fn test_opaque_background() {
        let options = QrOptions {
            transparent_background: false,
            ..sized(46)
        };
        let image = encode_qr("A", &options).unwrap();
        assert_eq!(*image.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn test_foreground_colour() {
        let red = Rgba([200, 0, 0, 255]);
        let options = QrOptions {
            foreground: red,
            ..sized(230)
        };
        let image = encode_qr("A", &options).unwrap();
        assert_eq!(*image.get_pixel(15, 15), red);
    }

    #[test]
    fn test_oversized_content_fails() {
        let data = "x".repeat(5000);
        assert!(matches!(
            encode_qr(&data, &QrOptions::default()),
            Err(CertifyError::Qr(_))
        ));
    }

    #[test]
    fn test_oversized_bitmap_is_refused() {
        assert!(matches!(
            encode_qr("A", &sized(300_000)),
            Err(CertifyError::Qr(_))
        ));
        assert!(encode_qr("A", &sized(2_000)).is_ok());
    }
}
