/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// グラフを流れるフレームと、キャプチャデバイスの取得モードを表す型。

use std::time::Instant;

/// ピクセルフォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 24bit RGB（R, G, Bの順）
    Rgb8,
    /// 8bitグレースケール
    Gray8,
    /// 16bitグレースケール（リトルエンディアン、深度・IRで使用）
    Gray16,
}

impl PixelFormat {
    /// 1ピクセルあたりのバイト数
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Gray8 => 1,
            Self::Gray16 => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rgb8 => "rgb8",
            Self::Gray8 => "gray8",
            Self::Gray16 => "gray16",
        }
    }
}

/// 取得モード（Stream mode）
///
/// デバイスがどのモダリティを生成するかを選択する。
/// DepthRgb: RGB画像 + 深度、DepthIr: IR画像 + 深度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// RGB画像に位置合わせされた深度（depth + image）
    DepthRgb,
    /// 赤外線（depth + ir）
    DepthIr,
}

impl StreamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepthRgb => "depth_rgb",
            Self::DepthIr => "depth_ir",
        }
    }
}

/// 解像度（幅 x 高さ）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// ピクセル数
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// グラフを流れる画像フレーム
#[derive(Debug, Clone)]
pub struct Image {
    /// フレーム取得時刻
    pub timestamp: Instant,
    /// デバイス起動からの通し番号
    pub seq: u64,
    /// ピクセルデータ（行連続、Gray16はリトルエンディアン）
    pub data: Vec<u8>,
    /// 画像の幅
    pub width: u32,
    /// 画像の高さ
    pub height: u32,
    /// ピクセルフォーマット
    pub format: PixelFormat,
    /// オーバーレイノードが付与する注釈（FPS表示等）
    pub annotation: Option<String>,
}

impl Image {
    /// 新しいフレームを作成
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            timestamp: Instant::now(),
            seq: 0,
            data,
            width,
            height,
            format,
            annotation: None,
        }
    }

    /// 通し番号を設定
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    /// フォーマットと寸法から期待されるバッファ長
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// バッファ長が寸法と整合しているか
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    /// Gray16フレームのピクセル値を読み出す
    ///
    /// 範囲外、フォーマット不一致、バッファ長が寸法と不整合の場合はNone。
    pub fn gray16_at(&self, x: u32, y: u32) -> Option<u16> {
        if self.format != PixelFormat::Gray16 || x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 2;
        let bytes = self.data.get(idx..idx + 2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}

/// 1回のグラブで得られるフレームの束
///
/// depthは常に生成される。imageはDepthRgbモード、irはDepthIrモードでのみ生成される。
#[derive(Debug, Clone)]
pub struct CapturedFrames {
    /// RGB画像（DepthRgbモードのみ）
    pub image: Option<Image>,
    /// 深度マップ（Gray16、ミリメートル単位）
    pub depth: Image,
    /// IR画像（Gray16、DepthIrモードのみ）
    pub ir: Option<Image>,
}

impl CapturedFrames {
    /// この束を生成したモードを推定
    pub fn mode(&self) -> StreamMode {
        if self.ir.is_some() {
            StreamMode::DepthIr
        } else {
            StreamMode::DepthRgb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_bytes() {
        assert_eq!(PixelFormat::Rgb8.bytes_per_pixel(), 3);
        assert_eq!(PixelFormat::Gray8.bytes_per_pixel(), 1);
        assert_eq!(PixelFormat::Gray16.bytes_per_pixel(), 2);
    }

    #[test]
    fn test_image_well_formed() {
        let img = Image::new(vec![0u8; 640 * 480 * 3], 640, 480, PixelFormat::Rgb8);
        assert!(img.is_well_formed());

        let broken = Image::new(vec![0u8; 100], 640, 480, PixelFormat::Rgb8);
        assert!(!broken.is_well_formed());
    }

    #[test]
    fn test_gray16_at() {
        let mut data = vec![0u8; 4 * 4 * 2];
        // (2, 1) = 0x1234
        let idx = (1 * 4 + 2) * 2;
        data[idx] = 0x34;
        data[idx + 1] = 0x12;

        let img = Image::new(data, 4, 4, PixelFormat::Gray16);
        assert_eq!(img.gray16_at(2, 1), Some(0x1234));
        assert_eq!(img.gray16_at(0, 0), Some(0));
        assert_eq!(img.gray16_at(4, 0), None);
    }

    #[test]
    fn test_gray16_at_wrong_format() {
        let img = Image::new(vec![0u8; 4 * 4 * 3], 4, 4, PixelFormat::Rgb8);
        assert_eq!(img.gray16_at(0, 0), None);
    }

    #[test]
    fn test_gray16_at_short_buffer() {
        // 寸法上は4x4だがバッファが半分しかない壊れたフレーム
        let img = Image::new(vec![0u8; 4 * 4], 4, 4, PixelFormat::Gray16);
        assert!(!img.is_well_formed());
        assert_eq!(img.gray16_at(0, 0), Some(0));
        assert_eq!(img.gray16_at(3, 3), None);
    }

    #[test]
    fn test_captured_frames_mode() {
        let depth = Image::new(vec![0u8; 8], 2, 2, PixelFormat::Gray16);

        let rgb_bundle = CapturedFrames {
            image: Some(Image::new(vec![0u8; 12], 2, 2, PixelFormat::Rgb8)),
            depth: depth.clone(),
            ir: None,
        };
        assert_eq!(rgb_bundle.mode(), StreamMode::DepthRgb);

        let ir_bundle = CapturedFrames {
            image: None,
            depth,
            ir: Some(Image::new(vec![0u8; 8], 2, 2, PixelFormat::Gray16)),
        };
        assert_eq!(ir_bundle.mode(), StreamMode::DepthIr);
    }

    #[test]
    fn test_resolution_pixel_count() {
        let res = Resolution::new(640, 480);
        assert_eq!(res.pixel_count(), 307200);
    }
}
