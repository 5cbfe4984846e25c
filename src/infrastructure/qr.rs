use crate::domain::ports::QrRenderer;
use crate::error::{PaymentError, Result};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Pixel size of one QR module.
pub const MODULE_PIXELS: u32 = 10;

/// Renders SPD strings as black-on-white PNG QR codes, error-correction level Q by default.
#[derive(Debug, Clone, Copy)]
pub struct PngQrRenderer {
    ec_level: EcLevel,
    module_pixels: u32,
}

impl Default for PngQrRenderer {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::Q,
            module_pixels: MODULE_PIXELS,
        }
    }
}

impl PngQrRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ec_level(mut self, ec_level: EcLevel) -> Self {
        self.ec_level = ec_level;
        self
    }
}

impl QrRenderer for PngQrRenderer {
    fn render(&self, payload: &str) -> Result<Vec<u8>> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)
            .map_err(|e| PaymentError::Render(e.to_string()))?;

        // The quiet zone is the standard four-module border.
        let image = code
            .render::<Luma<u8>>()
            .dark_color(Luma([0u8]))
            .light_color(Luma([255u8]))
            .quiet_zone(true)
            .module_dimensions(self.module_pixels, self.module_pixels)
            .build();

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(image)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PaymentError::Render(e.to_string()))?;
        Ok(png)
    }
}
