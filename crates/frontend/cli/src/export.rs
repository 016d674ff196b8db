//! PNG export of rendered frames.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use emu_core::types::Frame;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to create {path}: {source}")]
    Create {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] png::EncodingError),
}

/// ARGB8888 pixels to tightly packed RGBA bytes.
pub fn frame_to_rgba(frame: &Frame) -> Vec<u8> {
    frame
        .pixels
        .iter()
        .flat_map(|&argb| {
            let [a, r, g, b] = argb.to_be_bytes();
            [r, g, b, a]
        })
        .collect()
}

pub fn save_png(frame: &Frame, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.display().to_string(),
        source,
    })?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame_to_rgba(frame))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_is_reordered_to_rgba() {
        let mut frame = Frame::new(2, 1);
        frame.set(0, 0, 0xFF808080);
        frame.set(1, 0, 0x00000000);

        assert_eq!(
            frame_to_rgba(&frame),
            vec![0x80, 0x80, 0x80, 0xFF, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn writes_png_signature() {
        let dir = std::env::temp_dir().join("hemu_export_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("pt.png");

        let mut frame = Frame::new(128, 128);
        frame.set(5, 5, 0xFFFFFFFF);
        save_png(&frame, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
