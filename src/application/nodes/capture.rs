//! キャプチャソースノード
//!
//! CapturePortをグラフのソースとして公開する。出力ポートは
//! `image` / `depth` / `ir` の3つで、現在の取得モードに応じて
//! そのティックに存在するものだけが送出される。
//!
//! 取得モードはStreamModeHandle経由で外部から書き換えられる。
//! 変更は次のティックの冒頭でデバイスへ適用される。
//!
//! 再初期化はスケジューラスレッドを眠らせない: バックオフは期限として
//! 記録し、期限が来るまでのティックは空のパスとして返す。

use crate::application::node::{Node, NodeIo};
use crate::application::recovery::RecoveryState;
use crate::domain::{CapturePort, DomainError, DomainResult, StreamMode};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// 取得モードの共有ハンドル
///
/// ノードがグラフに挿入された後も呼び出し側がモードを
/// 読み書きできるように、挿入前に取り出して保持する。
#[derive(Clone)]
pub struct StreamModeHandle {
    inner: Arc<Mutex<StreamMode>>,
}

impl StreamModeHandle {
    fn new(mode: StreamMode) -> Self {
        Self {
            inner: Arc::new(Mutex::new(mode)),
        }
    }

    /// 現在の設定値を取得
    pub fn get(&self) -> StreamMode {
        *self.inner.lock().expect("stream mode lock poisoned")
    }

    /// 設定値を書き換える
    pub fn set(&self, mode: StreamMode) {
        *self.inner.lock().expect("stream mode lock poisoned") = mode;
    }

    /// 設定値と引数を入れ替える
    ///
    /// デモループがバッチごとに `(next_mode, stream_mode)` を
    /// 入れ替えるための操作。
    pub fn swap(&self, next: &mut StreamMode) {
        let mut guard = self.inner.lock().expect("stream mode lock poisoned");
        std::mem::swap(&mut *guard, next);
    }
}

/// キャプチャソースノード
pub struct CaptureNode {
    port: Box<dyn CapturePort>,
    mode: StreamModeHandle,
    recovery: RecoveryState,
    /// 再初期化の実行期限（バックオフ満了時刻）。Noneなら通常運転
    reinit_due: Option<Instant>,
}

impl CaptureNode {
    pub const OUT_IMAGE: &'static str = "image";
    pub const OUT_DEPTH: &'static str = "depth";
    pub const OUT_IR: &'static str = "ir";

    /// ポートと再初期化状態からノードを作成
    ///
    /// ハンドルの初期値はポートの現在モード。
    pub fn new(port: Box<dyn CapturePort>, recovery: RecoveryState) -> Self {
        let mode = StreamModeHandle::new(port.stream_mode());
        Self {
            port,
            mode,
            recovery,
            reinit_due: None,
        }
    }

    /// 取得モードの共有ハンドルを取り出す（グラフ挿入前に呼ぶ）
    pub fn mode_handle(&self) -> StreamModeHandle {
        self.mode.clone()
    }

    /// ハンドルの値をデバイスへ適用する（差分があるときのみ）
    fn apply_pending_mode(&mut self) -> DomainResult<()> {
        let desired = self.mode.get();
        if desired != self.port.stream_mode() {
            tracing::info!("Switching stream mode to {}", desired.as_str());
            self.port.set_stream_mode(desired)?;
        }
        Ok(())
    }

    /// バックオフ付きの再初期化を予約する
    ///
    /// 累積失敗時間が上限を超えている場合は致命的エラーとして伝播する。
    fn schedule_reinitialize(&mut self) -> DomainResult<()> {
        if self.recovery.is_cumulative_failure_exceeded() {
            tracing::error!(
                "Capture device unrecoverable after {} reinitialization attempts",
                self.recovery.total_reinitializations()
            );
            return Err(DomainError::ReInitializationRequired);
        }

        let backoff = self.recovery.current_backoff();
        self.recovery.record_reinitialization_attempt();
        tracing::warn!(
            backoff_ms = backoff.as_millis() as u64,
            attempt = self.recovery.total_reinitializations(),
            "Scheduling capture reinitialization"
        );
        self.reinit_due = Some(Instant::now() + backoff);
        Ok(())
    }

    /// 予約済みの再初期化を処理する
    ///
    /// # Returns
    /// このティックでグラブしてよい場合は true（予約なし、または
    /// 再初期化が完了した）。バックオフ待ちの間は false。
    fn run_pending_reinitialize(&mut self) -> DomainResult<bool> {
        let due = match self.reinit_due {
            Some(due) => due,
            None => return Ok(true),
        };
        if Instant::now() < due {
            return Ok(false);
        }

        self.reinit_due = None;
        tracing::info!("Reinitializing capture device");
        match self.port.reinitialize() {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!("Reinitialization failed: {:?}", e);
                self.schedule_reinitialize()?;
                Ok(false)
            }
        }
    }
}

impl Node for CaptureNode {
    fn name(&self) -> &str {
        "capture"
    }

    fn outputs(&self) -> &[&str] {
        &[Self::OUT_IMAGE, Self::OUT_DEPTH, Self::OUT_IR]
    }

    fn process(&mut self, io: &mut NodeIo) -> DomainResult<()> {
        self.apply_pending_mode()?;

        if !self.run_pending_reinitialize()? {
            // バックオフ待ち: このティックは空のパス
            return Ok(());
        }

        match self.port.grab() {
            Ok(Some(frames)) => {
                self.recovery.record_success();
                if let Some(image) = frames.image {
                    io.emit(Self::OUT_IMAGE, Arc::new(image));
                }
                if let Some(ir) = frames.ir {
                    io.emit(Self::OUT_IR, Arc::new(ir));
                }
                io.emit(Self::OUT_DEPTH, Arc::new(frames.depth));
                Ok(())
            }
            Ok(None) => {
                // タイムアウト: 閾値を超えたら再初期化を予約
                if self.recovery.record_timeout() {
                    self.schedule_reinitialize()?;
                }
                Ok(())
            }
            Err(DomainError::DeviceNotAvailable) => {
                self.schedule_reinitialize()?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn reinitializations(&self) -> u64 {
        self.recovery.total_reinitializations()
    }
}
