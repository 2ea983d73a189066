//! 表示アダプタのセレクタ（実行時選択用）
//!
//! ビルド時のfeatureフラグではなく、実行時に設定でバックエンドを選択するための列挙型。
//! vtableのオーバーヘッドを避けるため、trait objectではなくenumでディスパッチ。

use crate::domain::{DisplayBackend, DisplayConfig, DisplayPort, DomainResult, Image};
use crate::infrastructure::log_display::LogDisplayAdapter;
use crate::infrastructure::png_display::PngDisplayAdapter;

/// 表示アダプタの選択
pub enum DisplaySelector {
    /// 構造化ログへの出力（デフォルト）
    Log(LogDisplayAdapter),
    /// PNGファイルへの書き出し
    Png(PngDisplayAdapter),
}

impl DisplaySelector {
    /// 設定からバックエンドを選択して構築する
    ///
    /// 各表示シンクが独立したインスタンスを持つため、シンクごとに呼び出す。
    pub fn from_config(config: &DisplayConfig) -> DomainResult<Self> {
        match config.backend {
            DisplayBackend::Log => Ok(DisplaySelector::Log(LogDisplayAdapter::new())),
            DisplayBackend::Png => Ok(DisplaySelector::Png(PngDisplayAdapter::new(
                config.output_dir.clone(),
                config.frame_stride,
            )?)),
        }
    }

    pub fn backend_type(&self) -> &'static str {
        match self {
            DisplaySelector::Log(_) => "log",
            DisplaySelector::Png(_) => "png",
        }
    }
}

impl DisplayPort for DisplaySelector {
    fn show(&mut self, window: &str, image: &Image) -> DomainResult<()> {
        match self {
            DisplaySelector::Log(adapter) => adapter.show(window, image),
            DisplaySelector::Png(adapter) => adapter.show(window, image),
        }
    }

    fn shown_frames(&self, window: &str) -> u64 {
        match self {
            DisplaySelector::Log(adapter) => adapter.shown_frames(window),
            DisplaySelector::Png(adapter) => adapter.shown_frames(window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PixelFormat;
    use tempfile::tempdir;

    #[test]
    fn test_log_backend_by_default() {
        let selector = DisplaySelector::from_config(&DisplayConfig::default()).unwrap();
        assert_eq!(selector.backend_type(), "log");
    }

    #[test]
    fn test_png_backend_from_config() {
        let dir = tempdir().unwrap();
        let config = DisplayConfig {
            backend: DisplayBackend::Png,
            output_dir: dir.path().to_string_lossy().into_owned(),
            ..DisplayConfig::default()
        };

        let mut selector = DisplaySelector::from_config(&config).unwrap();
        assert_eq!(selector.backend_type(), "png");

        let img = Image::new(vec![0u8; 2 * 2 * 3], 2, 2, PixelFormat::Rgb8);
        selector.show("image display", &img).unwrap();
        assert_eq!(selector.shown_frames("image display"), 1);
    }
}
