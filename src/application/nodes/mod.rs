//! 組み込みノード集
//!
//! デモスクリプトが配線するノード: キャプチャソース、FPSオーバーレイ、
//! フォーマット変換、表示シンク。

pub mod capture;
pub mod convert;
pub mod display;
pub mod fps_overlay;

pub use capture::{CaptureNode, StreamModeHandle};
pub use convert::ConvertNode;
pub use display::DisplaySinkNode;
pub use fps_overlay::FpsOverlayNode;
