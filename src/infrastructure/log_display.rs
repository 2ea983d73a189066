/// ログ表示アダプタ
///
/// GUIウィンドウの代わりに、表示されるはずのフレームを構造化ログとして
/// 出力するDisplayPort実装。デフォルトのバックエンド。

use crate::domain::{window_title, DisplayPort, DomainResult, Image};
use std::collections::HashMap;
use tracing::{debug, info};

/// ログ表示アダプタ
#[derive(Default)]
pub struct LogDisplayAdapter {
    counts: HashMap<String, u64>,
}

impl LogDisplayAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplayPort for LogDisplayAdapter {
    fn show(&mut self, window: &str, image: &Image) -> DomainResult<()> {
        let count = self.counts.entry(window.to_string()).or_insert(0);
        *count += 1;

        if *count == 1 {
            info!(
                window = window,
                width = image.width,
                height = image.height,
                format = image.format.as_str(),
                "Display window opened"
            );
        }
        debug!(
            title = window_title(window, image),
            seq = image.seq,
            "Frame shown"
        );
        Ok(())
    }

    fn shown_frames(&self, window: &str) -> u64 {
        self.counts.get(window).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PixelFormat;

    #[test]
    fn test_counts_per_window() {
        let mut display = LogDisplayAdapter::new();
        let img = Image::new(vec![0u8; 12], 2, 2, PixelFormat::Rgb8);

        display.show("image display", &img).unwrap();
        display.show("image display", &img).unwrap();
        display.show("depth display", &img).unwrap();

        assert_eq!(display.shown_frames("image display"), 2);
        assert_eq!(display.shown_frames("depth display"), 1);
        assert_eq!(display.shown_frames("IR display"), 0);
    }
}
