/// PNG表示アダプタ
///
/// フレームをPNGファイルとして書き出すDisplayPort実装。
/// 全フレームを書くとディスクを圧迫するため、ウィンドウごとに
/// frame_strideフレームに1枚だけ書き出す。

use crate::domain::{DisplayPort, DomainError, DomainResult, Image, PixelFormat};
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// PNG表示アダプタ
pub struct PngDisplayAdapter {
    output_dir: PathBuf,
    frame_stride: u64,
    counts: HashMap<String, u64>,
}

impl PngDisplayAdapter {
    pub fn new(output_dir: impl Into<PathBuf>, frame_stride: u64) -> DomainResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|e| {
            DomainError::Display(format!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;
        Ok(Self {
            output_dir,
            frame_stride: frame_stride.max(1),
            counts: HashMap::new(),
        })
    }

    fn frame_path(&self, window: &str, seq: u64) -> PathBuf {
        let stem: String = window
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.output_dir.join(format!("{}_{:06}.png", stem, seq))
    }

    fn write_png(&self, path: &PathBuf, image: &Image) -> DomainResult<()> {
        if !image.is_well_formed() {
            return Err(DomainError::Display(format!(
                "Malformed frame: {} bytes for {}x{} {}",
                image.data.len(),
                image.width,
                image.height,
                image.format.as_str()
            )));
        }

        let save_error = |e: image::ImageError| {
            DomainError::Display(format!("Failed to write {}: {}", path.display(), e))
        };

        match image.format {
            PixelFormat::Rgb8 => {
                let buf = RgbImage::from_raw(image.width, image.height, image.data.clone())
                    .ok_or_else(|| DomainError::Display("RGB buffer size mismatch".to_string()))?;
                buf.save(path).map_err(save_error)
            }
            PixelFormat::Gray8 => {
                let buf = GrayImage::from_raw(image.width, image.height, image.data.clone())
                    .ok_or_else(|| DomainError::Display("Gray buffer size mismatch".to_string()))?;
                buf.save(path).map_err(save_error)
            }
            PixelFormat::Gray16 => {
                let pixels: Vec<u16> = image
                    .data
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                let buf: ImageBuffer<Luma<u16>, Vec<u16>> =
                    ImageBuffer::from_raw(image.width, image.height, pixels).ok_or_else(|| {
                        DomainError::Display("Gray16 buffer size mismatch".to_string())
                    })?;
                buf.save(path).map_err(save_error)
            }
        }
    }
}

impl DisplayPort for PngDisplayAdapter {
    fn show(&mut self, window: &str, image: &Image) -> DomainResult<()> {
        let count = self.counts.entry(window.to_string()).or_insert(0);
        *count += 1;

        if (*count - 1) % self.frame_stride != 0 {
            return Ok(());
        }

        let path = self.frame_path(window, image.seq);
        self.write_png(&path, image)?;
        debug!(path = %path.display(), seq = image.seq, "Frame written");
        Ok(())
    }

    fn shown_frames(&self, window: &str) -> u64 {
        self.counts.get(window).copied().unwrap_or(0)
    }
}
