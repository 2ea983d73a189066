//! Infrastructure層
//!
//! Domain層のPort（CapturePort, DisplayPort）に対する具体的な実装。
//! 実機デバイスやGUIを持たない環境でも動くアダプタのみを提供する。

pub mod display_selector;
pub mod log_display;
pub mod mock_capture;
pub mod png_display;
pub mod synthetic_capture;

pub use display_selector::DisplaySelector;
pub use log_display::LogDisplayAdapter;
pub use mock_capture::MockCaptureAdapter;
pub use png_display::PngDisplayAdapter;
pub use synthetic_capture::SyntheticCaptureAdapter;
