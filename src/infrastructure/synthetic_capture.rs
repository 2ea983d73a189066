/// 合成キャプチャアダプタ
///
/// 実機OpenNI系デバイスの代わりに、バックグラウンドスレッドで
/// 決定的なテストパターンを生成するCapturePort実装。
/// ドライバ同様、生成側は最新フレームのみ保持する（容量1チャネル）。

use crate::domain::{
    CaptureConfig, CapturedFrames, CapturePort, DeviceInfo, DomainError, DomainResult, Image,
    PixelFormat, StreamMode,
};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

/// 位置合わせ無効時の深度パターンの水平シフト（ピクセル）
///
/// 実機ではRGBカメラと深度カメラの基線長に由来する視差。
const BASELINE_SHIFT_PX: u32 = 8;

/// 生成スレッドと共有する状態
struct Shared {
    mode: Mutex<StreamMode>,
    stop: AtomicBool,
}

/// 合成キャプチャアダプタ
pub struct SyntheticCaptureAdapter {
    shared: Arc<Shared>,
    rx: Receiver<CapturedFrames>,
    handle: Option<JoinHandle<()>>,
    width: u32,
    height: u32,
    fps: u32,
    registration: bool,
    timeout: Duration,
}

impl SyntheticCaptureAdapter {
    pub fn new(config: &CaptureConfig) -> DomainResult<Self> {
        let shared = Arc::new(Shared {
            mode: Mutex::new(config.stream_mode.into()),
            stop: AtomicBool::new(false),
        });
        let (rx, handle) = spawn_generator(
            Arc::clone(&shared),
            config.width,
            config.height,
            config.fps,
            config.registration,
        )?;

        info!(
            width = config.width,
            height = config.height,
            fps = config.fps,
            registration = config.registration,
            "Synthetic capture device started"
        );

        Ok(Self {
            shared,
            rx,
            handle: Some(handle),
            width: config.width,
            height: config.height,
            fps: config.fps,
            registration: config.registration,
            timeout: config.timeout(),
        })
    }

    fn stop_generator(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// チャネルに残った古いフレームを破棄する
    fn drain_stale(&self) {
        while self.rx.try_recv().is_ok() {}
    }
}

impl CapturePort for SyntheticCaptureAdapter {
    fn grab(&mut self) -> DomainResult<Option<CapturedFrames>> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(frames) => Ok(Some(frames)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(DomainError::DeviceNotAvailable),
        }
    }

    fn set_stream_mode(&mut self, mode: StreamMode) -> DomainResult<()> {
        {
            let mut current = self
                .shared
                .mode
                .lock()
                .map_err(|_| DomainError::Capture("stream mode lock poisoned".to_string()))?;
            if *current == mode {
                return Ok(());
            }
            *current = mode;
        }
        // 旧モードのフレームが次のgrab()で出てこないように捨てる
        self.drain_stale();
        debug!(mode = mode.as_str(), "Stream mode switched");
        Ok(())
    }

    fn stream_mode(&self) -> StreamMode {
        self.shared
            .mode
            .lock()
            .map(|mode| *mode)
            .unwrap_or(StreamMode::DepthRgb)
    }

    fn reinitialize(&mut self) -> DomainResult<()> {
        info!("Reinitializing synthetic capture device");
        self.stop_generator();
        self.shared.stop.store(false, Ordering::SeqCst);
        let (rx, handle) = spawn_generator(
            Arc::clone(&self.shared),
            self.width,
            self.height,
            self.fps,
            self.registration,
        )?;
        self.rx = rx;
        self.handle = Some(handle);
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            width: self.width,
            height: self.height,
            fps: self.fps,
            name: "Synthetic Depth Camera".to_string(),
            registration: self.registration,
        }
    }
}

impl Drop for SyntheticCaptureAdapter {
    fn drop(&mut self) {
        self.stop_generator();
    }
}

fn spawn_generator(
    shared: Arc<Shared>,
    width: u32,
    height: u32,
    fps: u32,
    registration: bool,
) -> DomainResult<(Receiver<CapturedFrames>, JoinHandle<()>)> {
    let (tx, rx) = bounded::<CapturedFrames>(1);
    let drain = rx.clone();
    let handle = std::thread::Builder::new()
        .name("synthetic-capture".to_string())
        .spawn(move || generator_loop(shared, tx, drain, width, height, fps, registration))
        .map_err(|e| {
            DomainError::Initialization(format!("Failed to spawn capture generator: {}", e))
        })?;
    Ok((rx, handle))
}

fn generator_loop(
    shared: Arc<Shared>,
    tx: Sender<CapturedFrames>,
    drain: Receiver<CapturedFrames>,
    width: u32,
    height: u32,
    fps: u32,
    registration: bool,
) {
    let interval = Duration::from_secs_f64(1.0 / fps as f64);
    let mut seq: u64 = 0;

    loop {
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }
        std::thread::sleep(interval);
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }

        let mode = match shared.mode.lock() {
            Ok(mode) => *mode,
            Err(_) => break,
        };
        let frames = synthesize_frames(mode, width, height, seq, registration);
        seq += 1;

        // 最新フレームのみ保持: 満杯なら古い方を捨ててから入れ直す
        if let Err(TrySendError::Full(frames)) = tx.try_send(frames) {
            let _ = drain.try_recv();
            let _ = tx.try_send(frames);
        }
    }
    debug!("Capture generator thread stopped");
}

/// 指定モードのフレーム束を合成する
pub(crate) fn synthesize_frames(
    mode: StreamMode,
    width: u32,
    height: u32,
    seq: u64,
    registration: bool,
) -> CapturedFrames {
    let depth = synthesize_depth(width, height, seq, registration);
    match mode {
        StreamMode::DepthRgb => CapturedFrames {
            image: Some(synthesize_rgb(width, height, seq)),
            depth,
            ir: None,
        },
        StreamMode::DepthIr => CapturedFrames {
            image: None,
            depth,
            ir: Some(synthesize_ir(width, height, seq)),
        },
    }
}

/// 深度パターン: 500mmから始まる斜めランプ（ミリメートル単位）
///
/// 位置合わせが無効な場合はパターンを基線分だけ水平シフトし、
/// 深度視点とRGB視点のずれを模す。
pub(crate) fn synthesize_depth(width: u32, height: u32, seq: u64, registration: bool) -> Image {
    let shift = if registration { 0 } else { BASELINE_SHIFT_PX };
    let phase = (seq % 256) as u32;
    let mut data = Vec::with_capacity((width * height * 2) as usize);
    for y in 0..height {
        for x in 0..width {
            let sx = x.wrapping_add(shift);
            let mm = 500 + ((sx + y + phase) * 3) % 1500;
            data.extend_from_slice(&(mm as u16).to_le_bytes());
        }
    }
    Image::new(data, width, height, PixelFormat::Gray16).with_seq(seq)
}

/// RGBパターン: 水平・垂直グラデーション + フレームごとに動く青成分
pub(crate) fn synthesize_rgb(width: u32, height: u32, seq: u64) -> Image {
    let phase = (seq % 256) as u32;
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 255 / width.max(1)) as u8);
            data.push((y * 255 / height.max(1)) as u8);
            data.push(((x + phase) % 256) as u8);
        }
    }
    Image::new(data, width, height, PixelFormat::Rgb8).with_seq(seq)
}

/// IRパターン: 10bit相当の水平グラデーション（Gray16格納）
pub(crate) fn synthesize_ir(width: u32, height: u32, seq: u64) -> Image {
    let phase = (seq % 1024) as u32;
    let mut data = Vec::with_capacity((width * height * 2) as usize);
    for _y in 0..height {
        for x in 0..width {
            let value = ((x * 1023 / width.max(1)) + phase) % 1024;
            data.extend_from_slice(&(value as u16).to_le_bytes());
        }
    }
    Image::new(data, width, height, PixelFormat::Gray16).with_seq(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StreamModeConfig;

    fn fast_config() -> CaptureConfig {
        CaptureConfig {
            stream_mode: StreamModeConfig::DepthRgb,
            registration: false,
            width: 16,
            height: 16,
            fps: 200,
            timeout_ms: 500,
            max_consecutive_timeouts: 5,
            reinit_initial_delay_ms: 1,
            reinit_max_delay_ms: 10,
        }
    }

    #[test]
    fn test_grab_yields_mode_shaped_bundle() {
        let mut adapter = SyntheticCaptureAdapter::new(&fast_config()).unwrap();
        let frames = adapter.grab().unwrap().expect("frame within timeout");

        assert_eq!(frames.mode(), StreamMode::DepthRgb);
        assert!(frames.image.as_ref().unwrap().is_well_formed());
        assert!(frames.depth.is_well_formed());
        assert_eq!(frames.depth.format, PixelFormat::Gray16);
    }

    #[test]
    fn test_mode_switch_reaches_grab() {
        let mut adapter = SyntheticCaptureAdapter::new(&fast_config()).unwrap();
        adapter.set_stream_mode(StreamMode::DepthIr).unwrap();
        assert_eq!(adapter.stream_mode(), StreamMode::DepthIr);

        let mut reached = false;
        for _ in 0..50 {
            if let Some(frames) = adapter.grab().unwrap() {
                if frames.mode() == StreamMode::DepthIr {
                    reached = true;
                    break;
                }
            }
        }
        assert!(reached, "DepthIr frames should arrive after mode switch");
    }

    #[test]
    fn test_reinitialize_keeps_grabbing() {
        let mut adapter = SyntheticCaptureAdapter::new(&fast_config()).unwrap();
        adapter.grab().unwrap();
        adapter.reinitialize().unwrap();

        let mut got = false;
        for _ in 0..10 {
            if adapter.grab().unwrap().is_some() {
                got = true;
                break;
            }
        }
        assert!(got, "grab should recover after reinitialization");
    }

    #[test]
    fn test_depth_registration_shifts_pattern() {
        let registered = synthesize_depth(32, 32, 0, true);
        let raw = synthesize_depth(32, 32, 0, false);

        // 位置合わせ済みの(x + baseline, y)は未補正の(x, y)と一致する
        assert_ne!(registered.gray16_at(0, 5), raw.gray16_at(0, 5));
        assert_eq!(registered.gray16_at(8, 5), raw.gray16_at(0, 5));
    }

    #[test]
    fn test_synthetic_frames_well_formed() {
        let bundle = synthesize_frames(StreamMode::DepthIr, 8, 8, 3, true);
        assert!(bundle.depth.is_well_formed());
        let ir = bundle.ir.unwrap();
        assert!(ir.is_well_formed());
        assert_eq!(ir.seq, 3);
        assert!(ir.gray16_at(0, 0).unwrap() < 1024);
    }
}
