//! 統計情報管理モジュール
//!
//! キャプチャFPS、ノードごとの処理時間、再初期化回数などの統計を収集・出力します。

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// 時間窓ベースのFPSカウンタ
///
/// FPSオーバーレイノードとStatsCollectorで共用。
#[derive(Debug, Clone)]
pub struct FpsCounter {
    times: VecDeque<Instant>,
    window: Duration,
}

impl FpsCounter {
    /// デフォルトの計測窓（1秒間のフレーム数）
    pub const DEFAULT_WINDOW_SECS: u64 = 1;

    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(Self::DEFAULT_WINDOW_SECS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            times: VecDeque::new(),
            window,
        }
    }

    /// フレーム受信を記録
    pub fn record(&mut self) {
        let now = Instant::now();
        self.times.push_back(now);

        // 窓より古いタイムスタンプを削除
        while let Some(&front) = self.times.front() {
            if now.duration_since(front) > self.window {
                self.times.pop_front();
            } else {
                break;
            }
        }
    }

    /// 現在のFPSを計算
    pub fn fps(&self) -> f64 {
        if self.times.len() < 2 {
            return 0.0;
        }
        let count = self.times.len() as f64;
        if let (Some(&first), Some(&last)) = (self.times.front(), self.times.back()) {
            let elapsed = last.duration_since(first).as_secs_f64();
            if elapsed > 0.0 {
                return count / elapsed;
            }
        }
        0.0
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// パーセンタイル統計値
#[derive(Debug, Clone)]
pub struct PercentileStats {
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub count: usize,
}

/// 統計情報コレクター
///
/// 処理時間はノード名をキーに記録する。
#[derive(Debug)]
pub struct StatsCollector {
    /// キャプチャFPS（ソースノードがフレームを送出したティックを数える）
    frames: FpsCounter,
    /// ノードごとの所要時間（最大1000サンプル保持）
    durations: std::collections::HashMap<String, VecDeque<Duration>>,
    /// 実行済みティック数
    tick_count: u64,
    /// 再初期化回数
    reinit_count: u64,
    /// 最後の統計出力時刻
    last_report: Instant,
    /// 統計出力間隔
    report_interval: Duration,
}

impl StatsCollector {
    /// 最大サンプル保持数（パーセンタイル計算用）
    const MAX_DURATION_SAMPLES: usize = 1000;

    /// 新しいStatsCollectorを作成
    ///
    /// # Arguments
    /// * `report_interval` - 統計出力間隔（例: 10秒）
    pub fn new(report_interval: Duration) -> Self {
        Self {
            frames: FpsCounter::new(),
            durations: std::collections::HashMap::new(),
            tick_count: 0,
            reinit_count: 0,
            last_report: Instant::now(),
            report_interval,
        }
    }

    /// フレーム送出を記録（FPS計測用）
    pub fn record_frame(&mut self) {
        self.frames.record();
    }

    /// ティック完了を記録
    pub fn record_tick(&mut self) {
        self.tick_count += 1;
    }

    /// ノードの処理時間を記録
    pub fn record_duration(&mut self, node: &str, duration: Duration) {
        let queue = self
            .durations
            .entry(node.to_string())
            .or_default();
        queue.push_back(duration);

        // 最大サンプル数を超えたら古いデータを破棄
        if queue.len() > Self::MAX_DURATION_SAMPLES {
            queue.pop_front();
        }
    }

    /// 再初期化の試行回数を加算する（スケジューラがティックごとの差分を渡す）
    pub fn record_reinitializations(&mut self, count: u64) {
        self.reinit_count += count;
    }

    /// 現在のキャプチャFPS
    pub fn current_fps(&self) -> f64 {
        self.frames.fps()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn reinit_count(&self) -> u64 {
        self.reinit_count
    }

    /// パーセンタイル統計を計算
    ///
    /// # Returns
    /// パーセンタイル統計値。データがない場合は None
    pub fn percentile_stats(&self, node: &str) -> Option<PercentileStats> {
        let queue = self.durations.get(node)?;
        if queue.is_empty() {
            return None;
        }

        let mut sorted: Vec<Duration> = queue.iter().copied().collect();
        sorted.sort();

        let count = sorted.len();
        let p50 = sorted[count * 50 / 100];
        let p95 = sorted[count * 95 / 100];
        let p99 = sorted[count * 99 / 100];

        Some(PercentileStats {
            p50,
            p95,
            p99,
            count,
        })
    }

    /// 統計レポートを出力すべきか判定
    pub fn should_report(&self) -> bool {
        self.last_report.elapsed() >= self.report_interval
    }

    /// 統計レポートを出力してタイマーをリセット
    pub fn report_and_reset(&mut self) {
        use tracing::info;

        info!("=== Graph Statistics ===");
        info!("Capture FPS: {:.1}", self.current_fps());
        info!("Ticks executed: {}", self.tick_count);

        let mut nodes: Vec<&String> = self.durations.keys().collect();
        nodes.sort();
        for node in nodes {
            if let Some(stats) = self.percentile_stats(node) {
                info!(
                    "{}: p50={:.2}ms, p95={:.2}ms, p99={:.2}ms (n={})",
                    node,
                    stats.p50.as_secs_f64() * 1000.0,
                    stats.p95.as_secs_f64() * 1000.0,
                    stats.p99.as_secs_f64() * 1000.0,
                    stats.count
                );
            }
        }

        info!("Reinitialization count: {}", self.reinit_count);
        info!("========================");

        self.last_report = Instant::now();
    }
}
