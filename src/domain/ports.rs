/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、グラフのノードがDIで注入される。
/// 実機のOpenNIドライバやGUIウィンドウはこの境界の向こう側に置く。

use crate::domain::{CapturedFrames, DomainResult, Image, StreamMode};

/// キャプチャポート: 深度カメラからのフレーム取得を抽象化
pub trait CapturePort: Send {
    /// 1回分のフレーム束を取得する
    ///
    /// # Returns
    /// - `Ok(Some(CapturedFrames))`: 取得成功（現在のモードに応じてimage/irが入る）
    /// - `Ok(None)`: タイムアウト（新しいフレームなし）
    /// - `Err(DomainError)`: 致命的エラー（再初期化が必要）
    fn grab(&mut self) -> DomainResult<Option<CapturedFrames>>;

    /// 取得モードを切り替える
    ///
    /// 次回以降のgrab()が新しいモードのフレーム束を返す。
    fn set_stream_mode(&mut self, mode: StreamMode) -> DomainResult<()>;

    /// 現在の取得モード
    fn stream_mode(&self) -> StreamMode;

    /// キャプチャセッションを再初期化
    ///
    /// デバイスとの接続が切断された場合などに呼び出される。
    fn reinitialize(&mut self) -> DomainResult<()>;

    /// キャプチャデバイスの情報を取得
    fn device_info(&self) -> DeviceInfo;
}

/// デバイス情報
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub name: String,
    /// 深度をRGB視点に位置合わせするか
    pub registration: bool,
}

/// 表示ポート: 名前付きウィンドウへの描画を抽象化
///
/// GUIレイヤは本リポジトリの範囲外のため、実装はログ出力やPNG書き出しなど
/// 非対話のバックエンドになる。
pub trait DisplayPort: Send {
    /// フレームを指定ウィンドウに表示する
    ///
    /// # Arguments
    /// - `window`: ウィンドウ名（構築時に指定された表示名）
    /// - `image`: 表示するフレーム
    fn show(&mut self, window: &str, image: &Image) -> DomainResult<()>;

    /// これまでに表示したフレーム数（ウィンドウ単位）
    fn shown_frames(&self, window: &str) -> u64;
}

/// ウィンドウタイトルを組み立てるヘルパー
///
/// 注釈付きフレーム（FPSオーバーレイ通過後）はタイトルに注釈を併記する。
pub fn window_title(window: &str, image: &Image) -> String {
    match &image.annotation {
        Some(note) => format!("{} [{}]", window, note),
        None => window.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PixelFormat;

    #[test]
    fn test_window_title_plain() {
        let img = Image::new(vec![0u8; 12], 2, 2, PixelFormat::Rgb8);
        assert_eq!(window_title("depth display", &img), "depth display");
    }

    #[test]
    fn test_window_title_annotated() {
        let mut img = Image::new(vec![0u8; 12], 2, 2, PixelFormat::Rgb8);
        img.annotation = Some("fps: 29.7 fps".to_string());
        assert_eq!(
            window_title("image display", &img),
            "image display [fps: 29.7 fps]"
        );
    }
}
