/// モックキャプチャアダプタ
///
/// テスト用のCapturePort実装。スクリプト化されたタイムアウト・エラーの
/// 注入と、デバイスが観測した取得モードの履歴記録を提供する。

use crate::domain::{
    CapturedFrames, CapturePort, DeviceInfo, DomainError, DomainResult, Image, PixelFormat,
    StreamMode,
};
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

/// モックキャプチャアダプタ
pub struct MockCaptureAdapter {
    mode: StreamMode,
    width: u32,
    height: u32,
    seq: u64,
    /// 先に消費されるエラー予算（1グラブにつき1消費）
    pending_errors: u32,
    /// エラーの次に消費されるタイムアウト予算
    pending_timeouts: u32,
    mode_history: Arc<Mutex<Vec<StreamMode>>>,
    reinit_count: Arc<AtomicU64>,
}

impl MockCaptureAdapter {
    pub fn new(mode: StreamMode, width: u32, height: u32) -> Self {
        Self {
            mode,
            width,
            height,
            seq: 0,
            pending_errors: 0,
            pending_timeouts: 0,
            mode_history: Arc::new(Mutex::new(Vec::new())),
            reinit_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 最初のnグラブをタイムアウトにする
    pub fn with_timeouts(mut self, n: u32) -> Self {
        self.pending_timeouts = n;
        self
    }

    /// 最初のnグラブをDeviceNotAvailableにする
    pub fn with_errors(mut self, n: u32) -> Self {
        self.pending_errors = n;
        self
    }

    /// 成功したグラブ時点のモード履歴
    pub fn mode_history(&self) -> Arc<Mutex<Vec<StreamMode>>> {
        Arc::clone(&self.mode_history)
    }

    /// reinitialize()が呼ばれた回数
    pub fn reinit_count(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.reinit_count)
    }

    fn make_frames(&self) -> CapturedFrames {
        let pixels = (self.width * self.height) as usize;
        let depth = Image::new(
            vec![0u8; pixels * 2],
            self.width,
            self.height,
            PixelFormat::Gray16,
        )
        .with_seq(self.seq);

        match self.mode {
            StreamMode::DepthRgb => CapturedFrames {
                image: Some(
                    Image::new(vec![0u8; pixels * 3], self.width, self.height, PixelFormat::Rgb8)
                        .with_seq(self.seq),
                ),
                depth,
                ir: None,
            },
            StreamMode::DepthIr => CapturedFrames {
                image: None,
                depth,
                ir: Some(
                    Image::new(
                        vec![0u8; pixels * 2],
                        self.width,
                        self.height,
                        PixelFormat::Gray16,
                    )
                    .with_seq(self.seq),
                ),
            },
        }
    }
}

impl CapturePort for MockCaptureAdapter {
    fn grab(&mut self) -> DomainResult<Option<CapturedFrames>> {
        if self.pending_errors > 0 {
            self.pending_errors -= 1;
            return Err(DomainError::DeviceNotAvailable);
        }
        if self.pending_timeouts > 0 {
            self.pending_timeouts -= 1;
            return Ok(None);
        }

        self.mode_history
            .lock()
            .expect("mode history lock poisoned")
            .push(self.mode);
        let frames = self.make_frames();
        self.seq += 1;
        Ok(Some(frames))
    }

    fn set_stream_mode(&mut self, mode: StreamMode) -> DomainResult<()> {
        self.mode = mode;
        Ok(())
    }

    fn stream_mode(&self) -> StreamMode {
        self.mode
    }

    fn reinitialize(&mut self) -> DomainResult<()> {
        self.reinit_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            width: self.width,
            height: self.height,
            fps: 30,
            name: "Mock Depth Camera".to_string(),
            registration: false,
        }
    }
}
