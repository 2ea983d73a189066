//! 再初期化ロジックモジュール
//!
//! キャプチャデバイスの再初期化を指数バックオフで制御します。
//! デバイス切断後の遅延再接続を明示的な状態機械として持つ。

use std::time::{Duration, Instant};

/// 再初期化ポリシー
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    /// 連続タイムアウト閾値（この回数を超えたら再初期化）
    pub consecutive_timeout_threshold: u32,
    /// 初期バックオフ時間
    pub initial_backoff: Duration,
    /// 最大バックオフ時間
    pub max_backoff: Duration,
    /// 累積失敗時間の上限（これを超えたら致命的エラー）
    pub max_cumulative_failure: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            consecutive_timeout_threshold: 30, // 約3秒（100ms * 30）
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            max_cumulative_failure: Duration::from_secs(60),
        }
    }
}

/// 再初期化状態管理
#[derive(Debug)]
pub struct RecoveryState {
    policy: RecoveryPolicy,
    consecutive_timeouts: u32,
    current_backoff: Duration,
    cumulative_failure_start: Option<Instant>,
    total_reinitializations: u64,
}

impl RecoveryState {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            current_backoff: policy.initial_backoff,
            policy,
            consecutive_timeouts: 0,
            cumulative_failure_start: None,
            total_reinitializations: 0,
        }
    }

    /// デフォルトポリシーでRecoveryStateを作成
    pub fn with_default_policy() -> Self {
        Self::new(RecoveryPolicy::default())
    }

    /// タイムアウトを記録
    ///
    /// # Returns
    /// 再初期化が必要な場合は true
    pub fn record_timeout(&mut self) -> bool {
        self.consecutive_timeouts += 1;

        if self.consecutive_timeouts >= self.policy.consecutive_timeout_threshold {
            self.consecutive_timeouts = 0;
            true
        } else {
            false
        }
    }

    /// 成功を記録（連続タイムアウトとバックオフをリセット）
    pub fn record_success(&mut self) {
        self.consecutive_timeouts = 0;
        self.current_backoff = self.policy.initial_backoff;
        self.cumulative_failure_start = None;
    }

    /// 再初期化試行を記録
    ///
    /// 次回のバックオフ時間を2倍にし（上限あり）、累積失敗時間の計測を開始する。
    pub fn record_reinitialization_attempt(&mut self) {
        self.total_reinitializations += 1;
        self.current_backoff = (self.current_backoff * 2).min(self.policy.max_backoff);

        if self.cumulative_failure_start.is_none() {
            self.cumulative_failure_start = Some(Instant::now());
        }
    }

    /// 現在のバックオフ時間を取得
    pub fn current_backoff(&self) -> Duration {
        self.current_backoff
    }

    /// 累積失敗時間を取得（失敗していない場合は None）
    pub fn cumulative_failure_duration(&self) -> Option<Duration> {
        self.cumulative_failure_start.map(|start| start.elapsed())
    }

    /// 累積失敗時間が上限を超えたか判定
    pub fn is_cumulative_failure_exceeded(&self) -> bool {
        match self.cumulative_failure_duration() {
            Some(duration) => duration >= self.policy.max_cumulative_failure,
            None => false,
        }
    }

    /// 総再初期化回数を取得
    pub fn total_reinitializations(&self) -> u64 {
        self.total_reinitializations
    }

    /// 連続タイムアウト回数を取得
    pub fn consecutive_timeouts(&self) -> u32 {
        self.consecutive_timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_threshold() {
        let mut state = RecoveryState::with_default_policy();

        // 閾値未満
        for _ in 0..29 {
            assert!(!state.record_timeout());
        }

        // 閾値到達
        assert!(state.record_timeout());
        assert_eq!(state.consecutive_timeouts(), 0);
    }

    #[test]
    fn test_success_resets_timeouts() {
        let mut state = RecoveryState::with_default_policy();

        for _ in 0..10 {
            state.record_timeout();
        }
        assert_eq!(state.consecutive_timeouts(), 10);

        state.record_success();
        assert_eq!(state.consecutive_timeouts(), 0);
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = RecoveryPolicy {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
            ..Default::default()
        };

        let mut state = RecoveryState::new(policy);
        assert_eq!(state.current_backoff(), Duration::from_millis(100));

        state.record_reinitialization_attempt();
        assert_eq!(state.current_backoff(), Duration::from_millis(200));

        state.record_reinitialization_attempt();
        assert_eq!(state.current_backoff(), Duration::from_millis(400));

        // 最大値で固定
        state.record_reinitialization_attempt();
        assert_eq!(state.current_backoff(), Duration::from_millis(500));

        state.record_reinitialization_attempt();
        assert_eq!(state.current_backoff(), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_resets_on_success() {
        let mut state = RecoveryState::with_default_policy();

        state.record_reinitialization_attempt();
        state.record_reinitialization_attempt();
        assert!(state.current_backoff() > Duration::from_millis(100));

        state.record_success();
        assert_eq!(state.current_backoff(), Duration::from_millis(100));
    }

    #[test]
    fn test_cumulative_failure_exceeded() {
        let policy = RecoveryPolicy {
            max_cumulative_failure: Duration::from_millis(50),
            ..Default::default()
        };

        let mut state = RecoveryState::new(policy);
        assert!(!state.is_cumulative_failure_exceeded());

        state.record_reinitialization_attempt();
        std::thread::sleep(Duration::from_millis(80));
        assert!(state.is_cumulative_failure_exceeded());

        state.record_success();
        assert!(!state.is_cumulative_failure_exceeded());
    }

    #[test]
    fn test_total_reinitializations() {
        let mut state = RecoveryState::with_default_policy();
        assert_eq!(state.total_reinitializations(), 0);

        state.record_reinitialization_attempt();
        state.record_reinitialization_attempt();
        assert_eq!(state.total_reinitializations(), 2);
    }
}
