mod application;
mod domain;
mod infrastructure;
mod logging;

use crate::application::graph::Graph;
use crate::application::nodes::{CaptureNode, ConvertNode, DisplaySinkNode, FpsOverlayNode};
use crate::application::recovery::{RecoveryPolicy, RecoveryState};
use crate::application::scheduler::SingleThreaded;
use crate::domain::config::AppConfig;
use crate::domain::ports::CapturePort; // traitメソッド使用のため
use crate::domain::StreamMode;
use crate::infrastructure::display_selector::DisplaySelector;
use crate::infrastructure::synthetic_capture::SyntheticCaptureAdapter;
use crate::logging::init_logging;
use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("depthflow starting...");

    match run() {
        Ok(_) => {
            tracing::info!("depthflow terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run() -> anyhow::Result<()> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            AppConfig::default()
        }
    };

    config.validate().context("Invalid configuration")?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Capture: {}x{} @ {}fps, mode={}, registration={}",
        config.capture.width,
        config.capture.height,
        config.capture.fps,
        StreamMode::from(config.capture.stream_mode).as_str(),
        config.capture.registration
    );
    tracing::info!(
        "Scheduler: {} iterations per batch, stats every {}s",
        config.scheduler.batch_iterations,
        config.scheduler.stats_interval_sec
    );

    // キャプチャアダプタの初期化
    tracing::info!("Initializing synthetic capture adapter...");
    let capture =
        SyntheticCaptureAdapter::new(&config.capture).context("Capture initialization failed")?;

    let device_info = capture.device_info();
    tracing::info!(
        "Capture initialized: {}x{} @ {}fps - {}",
        device_info.width,
        device_info.height,
        device_info.fps,
        device_info.name
    );

    // 再初期化ポリシーの設定
    let recovery = RecoveryState::new(RecoveryPolicy {
        consecutive_timeout_threshold: config.capture.max_consecutive_timeouts,
        initial_backoff: config.capture.reinit_initial_delay(),
        max_backoff: config.capture.reinit_max_delay(),
        max_cumulative_failure: Duration::from_secs(60),
    });

    // グラフの構築
    //
    // capture.image -> fps -> "image display"
    // capture.depth -> "depth display"
    // capture.ir -> convert -> "IR display"
    let capture_node = CaptureNode::new(Box::new(capture), recovery);
    let mode_handle = capture_node.mode_handle();

    let mut graph = Graph::new();
    let capture_id = graph.insert(Box::new(capture_node));
    let fps_id = graph.insert(Box::new(FpsOverlayNode::new("fps")));
    let convert_id = graph.insert(Box::new(ConvertNode::new(
        config.convert.target_format.into(),
        config.convert.alpha,
    )));
    let image_display_id = graph.insert(Box::new(DisplaySinkNode::new(
        config.display.image_window.clone(),
        Box::new(DisplaySelector::from_config(&config.display)?),
    )));
    let depth_display_id = graph.insert(Box::new(DisplaySinkNode::new(
        config.display.depth_window.clone(),
        Box::new(DisplaySelector::from_config(&config.display)?),
    )));
    let ir_display_id = graph.insert(Box::new(DisplaySinkNode::new(
        config.display.ir_window.clone(),
        Box::new(DisplaySelector::from_config(&config.display)?),
    )));

    graph.connect(capture_id, CaptureNode::OUT_IMAGE, fps_id, FpsOverlayNode::IN_IMAGE)?;
    graph.connect(fps_id, FpsOverlayNode::OUT_IMAGE, image_display_id, DisplaySinkNode::IN_IMAGE)?;
    graph.connect(capture_id, CaptureNode::OUT_DEPTH, depth_display_id, DisplaySinkNode::IN_IMAGE)?;
    graph.connect(capture_id, CaptureNode::OUT_IR, convert_id, ConvertNode::IN_IMAGE)?;
    graph.connect(convert_id, ConvertNode::OUT_IMAGE, ir_display_id, DisplaySinkNode::IN_IMAGE)?;

    let mut sched = SingleThreaded::with_stats_interval(graph, config.scheduler.stats_interval())?;

    // バッチ実行ループ: batch_iterationsティックごとに取得モードを入れ替える
    let mut next_mode = match StreamMode::from(config.capture.stream_mode) {
        StreamMode::DepthRgb => StreamMode::DepthIr,
        StreamMode::DepthIr => StreamMode::DepthRgb,
    };
    let mut batch: u64 = 0;

    tracing::info!("Starting scheduler loop...");
    loop {
        measure_span!("scheduler_batch", {
            sched.execute(config.scheduler.batch_iterations)?;
        });
        batch += 1;

        mode_handle.swap(&mut next_mode);
        tracing::info!(
            batch,
            mode = mode_handle.get().as_str(),
            "Stream mode toggled"
        );

        if let Some(max) = config.scheduler.max_batches {
            if batch >= max {
                tracing::info!("Reached max_batches={}, stopping", max);
                break;
            }
        }
    }

    Ok(())
}
