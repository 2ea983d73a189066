//! 表示シンクノード
//!
//! ウィンドウ名とDisplayPortを束ねたシンク。届いたフレームを
//! そのままバックエンドに渡す。表示の失敗はループを止める理由に
//! ならないため、ログとカウントに留める。

use crate::application::node::{Node, NodeIo};
use crate::domain::{DisplayPort, DomainResult};

/// 表示シンクノード
pub struct DisplaySinkNode {
    window: String,
    port: Box<dyn DisplayPort>,
    error_count: u64,
}

impl DisplaySinkNode {
    pub const IN_IMAGE: &'static str = "image";

    pub fn new(window: impl Into<String>, port: Box<dyn DisplayPort>) -> Self {
        Self {
            window: window.into(),
            port,
            error_count: 0,
        }
    }

    /// 表示に失敗した回数
    pub fn error_count(&self) -> u64 {
        self.error_count
    }
}

impl Node for DisplaySinkNode {
    fn name(&self) -> &str {
        &self.window
    }

    fn inputs(&self) -> &[&str] {
        &[Self::IN_IMAGE]
    }

    fn process(&mut self, io: &mut NodeIo) -> DomainResult<()> {
        let Some(packet) = io.take(Self::IN_IMAGE) else {
            return Ok(());
        };

        if let Err(e) = self.port.show(&self.window, &packet) {
            self.error_count += 1;
            tracing::warn!(
                window = %self.window,
                errors = self.error_count,
                "Display failed: {:?}",
                e
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, Image, PixelFormat};
    use std::collections::HashMap;
    use std::sync::Arc;

    /// 呼び出しを記録する表示ポート
    struct RecordingDisplay {
        calls: Arc<std::sync::Mutex<Vec<(String, u64)>>>,
        fail: bool,
    }

    impl DisplayPort for RecordingDisplay {
        fn show(&mut self, window: &str, image: &Image) -> DomainResult<()> {
            if self.fail {
                return Err(DomainError::Display("no surface".to_string()));
            }
            self.calls
                .lock()
                .unwrap()
                .push((window.to_string(), image.seq));
            Ok(())
        }

        fn shown_frames(&self, _window: &str) -> u64 {
            self.calls.lock().unwrap().len() as u64
        }
    }

    fn io_with_frame(seq: u64) -> NodeIo {
        let img = Image::new(vec![0u8; 12], 2, 2, PixelFormat::Rgb8).with_seq(seq);
        let mut inputs = HashMap::new();
        inputs.insert("image".to_string(), Arc::new(img));
        NodeIo::new(inputs)
    }

    #[test]
    fn test_forwards_to_port_with_window_name() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut node = DisplaySinkNode::new(
            "depth display",
            Box::new(RecordingDisplay {
                calls: Arc::clone(&calls),
                fail: false,
            }),
        );

        let mut io = io_with_frame(7);
        node.process(&mut io).unwrap();

        let recorded = calls.lock().unwrap();
        assert_eq!(recorded.as_slice(), &[("depth display".to_string(), 7)]);
    }

    #[test]
    fn test_display_failure_is_not_fatal() {
        let mut node = DisplaySinkNode::new(
            "IR display",
            Box::new(RecordingDisplay {
                calls: Arc::new(std::sync::Mutex::new(Vec::new())),
                fail: true,
            }),
        );

        for i in 0..3 {
            let mut io = io_with_frame(i);
            assert!(node.process(&mut io).is_ok());
        }
        assert_eq!(node.error_count(), 3);
    }

    #[test]
    fn test_no_input_is_noop() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut node = DisplaySinkNode::new(
            "image display",
            Box::new(RecordingDisplay {
                calls: Arc::clone(&calls),
                fail: false,
            }),
        );

        let mut io = NodeIo::new(HashMap::new());
        node.process(&mut io).unwrap();
        assert!(calls.lock().unwrap().is_empty());
    }
}
