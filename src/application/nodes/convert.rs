//! フォーマット変換ノード
//!
//! 変換先フォーマットとスケーリング係数（alpha）を指定して
//! 画像ストリームを変換する。主用途は16bit IRの8bit可視化。

use crate::application::node::{Node, NodeIo};
use crate::domain::{DomainError, DomainResult, Image, PixelFormat};
use std::sync::Arc;

/// フォーマット変換ノード
pub struct ConvertNode {
    target: PixelFormat,
    alpha: f32,
}

impl ConvertNode {
    pub const IN_IMAGE: &'static str = "image";
    pub const OUT_IMAGE: &'static str = "image";

    pub fn new(target: PixelFormat, alpha: f32) -> Self {
        Self { target, alpha }
    }

    /// 1フレームを変換する
    ///
    /// サポートする組み合わせ:
    /// - Gray16 -> Gray8: 値 * alpha を飽和キャスト
    /// - Gray8  -> Gray8: 値 * alpha を飽和キャスト
    /// - Rgb8   -> Gray8: 整数輝度（BT.601近似） * alpha
    /// それ以外は `DomainError::Convert`。
    pub fn convert(&self, src: &Image) -> DomainResult<Image> {
        let data = match (src.format, self.target) {
            (PixelFormat::Gray16, PixelFormat::Gray8) => {
                let mut out = Vec::with_capacity(src.data.len() / 2);
                for chunk in src.data.chunks_exact(2) {
                    let value = u16::from_le_bytes([chunk[0], chunk[1]]);
                    out.push(scale_to_u8(value as f32, self.alpha));
                }
                out
            }
            (PixelFormat::Gray8, PixelFormat::Gray8) => src
                .data
                .iter()
                .map(|&v| scale_to_u8(v as f32, self.alpha))
                .collect(),
            (PixelFormat::Rgb8, PixelFormat::Gray8) => {
                let mut out = Vec::with_capacity(src.data.len() / 3);
                for px in src.data.chunks_exact(3) {
                    // BT.601の整数近似: (77R + 150G + 29B) >> 8
                    let luma =
                        (77 * px[0] as u32 + 150 * px[1] as u32 + 29 * px[2] as u32) >> 8;
                    out.push(scale_to_u8(luma as f32, self.alpha));
                }
                out
            }
            (from, to) => {
                return Err(DomainError::Convert(format!(
                    "Unsupported conversion {} -> {}",
                    from.as_str(),
                    to.as_str()
                )));
            }
        };

        let mut converted = Image::new(data, src.width, src.height, self.target);
        converted.timestamp = src.timestamp;
        converted.seq = src.seq;
        converted.annotation = src.annotation.clone();
        Ok(converted)
    }

    /// 無変換で転送できるか（同一フォーマット・alpha == 1.0）
    fn is_identity(&self, src: &Image) -> bool {
        src.format == self.target && self.alpha == 1.0
    }
}

fn scale_to_u8(value: f32, alpha: f32) -> u8 {
    (value * alpha).round().clamp(0.0, 255.0) as u8
}

impl Node for ConvertNode {
    fn name(&self) -> &str {
        "convert"
    }

    fn inputs(&self) -> &[&str] {
        &[Self::IN_IMAGE]
    }

    fn outputs(&self) -> &[&str] {
        &[Self::OUT_IMAGE]
    }

    fn process(&mut self, io: &mut NodeIo) -> DomainResult<()> {
        let Some(packet) = io.take(Self::IN_IMAGE) else {
            return Ok(());
        };

        if self.is_identity(&packet) {
            // バッファコピーなしで転送
            io.emit(Self::OUT_IMAGE, packet);
            return Ok(());
        }

        let converted = self.convert(&packet)?;
        io.emit(Self::OUT_IMAGE, Arc::new(converted));
        Ok(())
    }
}
