//! Synthesized cover images.
//!
//! New synchronized playlists need a cover to carry their definition. Hosts
//! either supply their own JPEG or generate one here: a flat colour, or noise
//! drawn from a small palette.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::Rng;

use crate::error::GenerateError;

/// Black and white palette
pub const BW_PALETTE: &[&str] = &["#000000", "#FFFFFF"];

/// Default pastel palette for generated covers
pub const PALETTE: &[&str] = &[
    "#FF9AA7", "#85D1B5", "#B980E3", "#79C2E6", "#FFD866", "#FFB384", "#D798CA", "#81CCE6",
    "#FF9D82", "#FFB3C8",
];

/// Parse a `#RRGGBB` colour
pub fn parse_hex_color(hex: &str) -> Result<[u8; 3], GenerateError> {
    let digits = hex
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| GenerateError::InvalidColor(hex.to_string()))?;

    let value = u32::from_str_radix(digits, 16)
        .map_err(|_| GenerateError::InvalidColor(hex.to_string()))?;

    Ok([(value >> 16) as u8, (value >> 8) as u8, value as u8])
}

/// Encode a flat-colour baseline JPEG
pub fn single_color_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Result<Vec<u8>, GenerateError> {
    encode(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

/// Encode a JPEG whose pixels are drawn uniformly from `palette`
pub fn palette_jpeg<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    palette: &[&str],
    rng: &mut R,
) -> Result<Vec<u8>, GenerateError> {
    if palette.is_empty() {
        return Err(GenerateError::EmptyPalette);
    }

    let colors = palette
        .iter()
        .map(|hex| parse_hex_color(hex))
        .collect::<Result<Vec<_>, _>>()?;

    let img = RgbImage::from_fn(width, height, |_, _| {
        Rgb(colors[rng.gen_range(0..colors.len())])
    });
    encode(img)
}

fn encode(img: RgbImage) -> Result<Vec<u8>, GenerateError> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{locate, COMMENT, START_OF_IMAGE};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF9AA7").unwrap(), [0xFF, 0x9A, 0xA7]);
        assert_eq!(parse_hex_color("#000000").unwrap(), [0, 0, 0]);
        assert!(parse_hex_color("FF9AA7").is_err());
        assert!(parse_hex_color("#FFF").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_palettes_parse() {
        for hex in PALETTE.iter().chain(BW_PALETTE) {
            assert!(parse_hex_color(hex).is_ok(), "{hex}");
        }
    }

    #[test]
    fn test_single_color_is_jpeg_without_comment() {
        let jpeg = single_color_jpeg(20, 20, [0, 0, 0]).unwrap();
        assert!(jpeg.starts_with(&START_OF_IMAGE));
        assert!(locate(&jpeg, &COMMENT).is_err());

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 20));
    }

    #[test]
    fn test_palette_jpeg() {
        let mut rng = StdRng::seed_from_u64(7);
        let jpeg = palette_jpeg(32, 16, PALETTE, &mut rng).unwrap();
        assert!(jpeg.starts_with(&START_OF_IMAGE));

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn test_palette_jpeg_rejects_bad_palettes() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            palette_jpeg(4, 4, &[], &mut rng),
            Err(GenerateError::EmptyPalette)
        ));
        assert!(matches!(
            palette_jpeg(4, 4, &["red"], &mut rng),
            Err(GenerateError::InvalidColor(_))
        ));
    }
}
