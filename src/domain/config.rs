//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{DomainError, DomainResult, PixelFormat, Resolution, StreamMode};

/// 取得モード（設定ファイル表現）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StreamModeConfig {
    /// RGB画像に位置合わせされた深度（depth + image）
    #[default]
    DepthRgb,
    /// 赤外線（depth + ir）
    DepthIr,
}

impl From<StreamModeConfig> for StreamMode {
    fn from(value: StreamModeConfig) -> Self {
        match value {
            StreamModeConfig::DepthRgb => StreamMode::DepthRgb,
            StreamModeConfig::DepthIr => StreamMode::DepthIr,
        }
    }
}

/// ピクセルフォーマット（設定ファイル表現）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormatConfig {
    Rgb8,
    #[default]
    Gray8,
    Gray16,
}

impl From<PixelFormatConfig> for PixelFormat {
    fn from(value: PixelFormatConfig) -> Self {
        match value {
            PixelFormatConfig::Rgb8 => PixelFormat::Rgb8,
            PixelFormatConfig::Gray8 => PixelFormat::Gray8,
            PixelFormatConfig::Gray16 => PixelFormat::Gray16,
        }
    }
}

/// 表示バックエンド
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBackend {
    /// ウィンドウ名・フレーム情報をログに出力（デフォルト）
    #[default]
    Log,
    /// フレームをPNGファイルとして書き出し
    Png,
}

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// キャプチャ設定
    pub capture: CaptureConfig,
    /// フォーマット変換設定
    pub convert: ConvertConfig,
    /// 表示設定
    pub display: DisplayConfig,
    /// スケジューラ設定
    pub scheduler: SchedulerConfig,
}

/// キャプチャ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaptureConfig {
    /// 起動時の取得モード
    ///
    /// 選択肢: "depth_rgb", "depth_ir"
    /// デフォルト: "depth_rgb"
    #[serde(default)]
    pub stream_mode: StreamModeConfig,

    /// 深度のRGB視点への位置合わせ（registration）を有効化
    ///
    /// デフォルト: false
    #[serde(default)]
    pub registration: bool,

    /// フレーム幅（ピクセル）
    pub width: u32,

    /// フレーム高さ（ピクセル）
    pub height: u32,

    /// デバイスの生成レート（フレーム/秒）
    pub fps: u32,

    /// グラブのタイムアウト（ミリ秒）
    ///
    /// デフォルト: 100ms
    pub timeout_ms: u64,

    /// 連続タイムアウト許容回数
    ///
    /// この回数を超えたら再初期化を実行
    /// デフォルト: 30回
    pub max_consecutive_timeouts: u32,

    /// 再初期化時の初期待機時間（ミリ秒）
    ///
    /// デフォルト: 100ms
    pub reinit_initial_delay_ms: u64,

    /// 再初期化時の最大待機時間（ミリ秒、指数バックオフの上限）
    ///
    /// デフォルト: 5000ms
    pub reinit_max_delay_ms: u64,
}

impl CaptureConfig {
    /// デフォルトのフレーム幅（VGA）
    pub const DEFAULT_WIDTH: u32 = 640;
    /// デフォルトのフレーム高さ（VGA）
    pub const DEFAULT_HEIGHT: u32 = 480;
    /// デフォルトの生成レート
    pub const DEFAULT_FPS: u32 = 30;
    /// デフォルトのグラブタイムアウト（ミリ秒）
    pub const DEFAULT_TIMEOUT_MS: u64 = 100;
    /// デフォルトの連続タイムアウト閾値（約3秒 @ 100ms）
    pub const DEFAULT_MAX_CONSECUTIVE_TIMEOUTS: u32 = 30;
    /// デフォルトの再初期化初期遅延（ミリ秒）
    pub const DEFAULT_REINIT_INITIAL_DELAY_MS: u64 = 100;
    /// デフォルトの再初期化最大遅延（ミリ秒）
    pub const DEFAULT_REINIT_MAX_DELAY_MS: u64 = 5000;
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            stream_mode: StreamModeConfig::default(),
            registration: false,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            fps: Self::DEFAULT_FPS,
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            max_consecutive_timeouts: Self::DEFAULT_MAX_CONSECUTIVE_TIMEOUTS,
            reinit_initial_delay_ms: Self::DEFAULT_REINIT_INITIAL_DELAY_MS,
            reinit_max_delay_ms: Self::DEFAULT_REINIT_MAX_DELAY_MS,
        }
    }
}

impl CaptureConfig {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn reinit_initial_delay(&self) -> Duration {
        Duration::from_millis(self.reinit_initial_delay_ms)
    }

    pub fn reinit_max_delay(&self) -> Duration {
        Duration::from_millis(self.reinit_max_delay_ms)
    }
}

/// フォーマット変換設定（IRストリームの可視化用）
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConvertConfig {
    /// 変換先フォーマット
    ///
    /// 選択肢: "rgb8", "gray8", "gray16"
    /// デフォルト: "gray8"
    #[serde(default)]
    pub target_format: PixelFormatConfig,

    /// スケーリング係数
    ///
    /// 16bit IRを8bitで可視化できるように縮める（例: 0.5）
    /// デフォルト: 0.5
    pub alpha: f32,
}

impl ConvertConfig {
    /// デフォルトのスケーリング係数
    pub const DEFAULT_ALPHA: f32 = 0.5;
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            target_format: PixelFormatConfig::Gray8,
            alpha: Self::DEFAULT_ALPHA,
        }
    }
}

/// 表示設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DisplayConfig {
    /// 表示バックエンド
    ///
    /// 選択肢: "log", "png"
    /// デフォルト: "log"
    #[serde(default)]
    pub backend: DisplayBackend,

    /// PNG書き出し先ディレクトリ（backend = "png" の場合のみ有効）
    ///
    /// デフォルト: "frames"
    pub output_dir: String,

    /// Nフレームに1枚だけ書き出す（backend = "png" の場合のみ有効）
    ///
    /// デフォルト: 30（約1秒に1枚 @ 30fps）
    pub frame_stride: u64,

    /// RGB画像ビューのウィンドウ名
    pub image_window: String,

    /// 深度ビューのウィンドウ名
    pub depth_window: String,

    /// IRビューのウィンドウ名
    pub ir_window: String,
}

impl DisplayConfig {
    pub const DEFAULT_OUTPUT_DIR: &'static str = "frames";
    pub const DEFAULT_FRAME_STRIDE: u64 = 30;
    pub const DEFAULT_IMAGE_WINDOW: &'static str = "image display";
    pub const DEFAULT_DEPTH_WINDOW: &'static str = "depth display";
    pub const DEFAULT_IR_WINDOW: &'static str = "IR display";
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            backend: DisplayBackend::default(),
            output_dir: Self::DEFAULT_OUTPUT_DIR.to_string(),
            frame_stride: Self::DEFAULT_FRAME_STRIDE,
            image_window: Self::DEFAULT_IMAGE_WINDOW.to_string(),
            depth_window: Self::DEFAULT_DEPTH_WINDOW.to_string(),
            ir_window: Self::DEFAULT_IR_WINDOW.to_string(),
        }
    }
}

/// スケジューラ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchedulerConfig {
    /// 1バッチあたりのグラフ実行ステップ数
    ///
    /// バッチ完了ごとに取得モードが入れ替えられる
    /// デフォルト: 100
    pub batch_iterations: u64,

    /// 実行する最大バッチ数（省略時は無制限）
    ///
    /// CI・デモ用。未設定なら無限ループ。
    #[serde(default)]
    pub max_batches: Option<u64>,

    /// 統計出力間隔（秒）
    ///
    /// デフォルト: 10秒
    pub stats_interval_sec: u64,
}

impl SchedulerConfig {
    /// デフォルトのバッチステップ数
    pub const DEFAULT_BATCH_ITERATIONS: u64 = 100;
    /// デフォルトの統計出力間隔（秒）
    pub const DEFAULT_STATS_INTERVAL_SEC: u64 = 10;
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_iterations: Self::DEFAULT_BATCH_ITERATIONS,
            max_batches: None,
            stats_interval_sec: Self::DEFAULT_STATS_INTERVAL_SEC,
        }
    }
}

impl SchedulerConfig {
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_sec)
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DomainError::Configuration(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse TOML: {}", e)))?;
        Ok(config)
    }

    /// 設定値の整合性を検証する
    pub fn validate(&self) -> DomainResult<()> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(DomainError::Configuration(format!(
                "Capture resolution must be non-zero, got {}x{}",
                self.capture.width, self.capture.height
            )));
        }
        if self.capture.fps == 0 {
            return Err(DomainError::Configuration(
                "Capture fps must be non-zero".to_string(),
            ));
        }
        if self.capture.timeout_ms == 0 {
            return Err(DomainError::Configuration(
                "Capture timeout must be non-zero".to_string(),
            ));
        }
        if !(self.convert.alpha.is_finite() && self.convert.alpha > 0.0) {
            return Err(DomainError::Configuration(format!(
                "Convert alpha must be positive and finite, got {}",
                self.convert.alpha
            )));
        }
        if self.scheduler.batch_iterations == 0 {
            return Err(DomainError::Configuration(
                "Scheduler batch_iterations must be non-zero".to_string(),
            ));
        }
        if self.display.frame_stride == 0 {
            return Err(DomainError::Configuration(
                "Display frame_stride must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
