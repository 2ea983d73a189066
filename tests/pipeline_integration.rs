//! デモグラフの統合テスト
//!
//! キャプチャ→FPSオーバーレイ→表示、深度→表示、IR→変換→表示の
//! 3系統を実際のグラフ・スケジューラで配線し、バッチ実行と
//! 取得モードの交互切り替えを検証する。

use depthflow::application::graph::Graph;
use depthflow::application::nodes::{CaptureNode, ConvertNode, DisplaySinkNode, FpsOverlayNode, StreamModeHandle};
use depthflow::application::recovery::RecoveryState;
use depthflow::application::scheduler::SingleThreaded;
use depthflow::domain::{DisplayPort, DomainResult, Image, PixelFormat, StreamMode};
use depthflow::infrastructure::MockCaptureAdapter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// ウィンドウごとの表示回数と最後のフレームを共有記録する表示ダブル
#[derive(Clone, Default)]
struct RecordingDisplay {
    shown: Arc<Mutex<HashMap<String, Vec<Image>>>>,
}

impl RecordingDisplay {
    fn count(&self, window: &str) -> usize {
        self.shown
            .lock()
            .unwrap()
            .get(window)
            .map(|frames| frames.len())
            .unwrap_or(0)
    }

    fn last(&self, window: &str) -> Option<Image> {
        self.shown
            .lock()
            .unwrap()
            .get(window)
            .and_then(|frames| frames.last().cloned())
    }
}

impl DisplayPort for RecordingDisplay {
    fn show(&mut self, window: &str, image: &Image) -> DomainResult<()> {
        self.shown
            .lock()
            .unwrap()
            .entry(window.to_string())
            .or_default()
            .push(image.clone());
        Ok(())
    }

    fn shown_frames(&self, window: &str) -> u64 {
        self.count(window) as u64
    }
}

struct DemoGraph {
    sched: SingleThreaded,
    handle: StreamModeHandle,
    mode_history: Arc<Mutex<Vec<StreamMode>>>,
    display: RecordingDisplay,
}

/// デモスクリプト相当の配線を構築する
fn build_demo_graph(initial_mode: StreamMode) -> DemoGraph {
    let adapter = MockCaptureAdapter::new(initial_mode, 8, 8);
    let mode_history = adapter.mode_history();
    let capture = CaptureNode::new(Box::new(adapter), RecoveryState::with_default_policy());
    let handle = capture.mode_handle();
    let display = RecordingDisplay::default();

    let mut graph = Graph::new();
    let capture_id = graph.insert(Box::new(capture));
    let fps_id = graph.insert(Box::new(FpsOverlayNode::new("fps")));
    let convert_id = graph.insert(Box::new(ConvertNode::new(PixelFormat::Gray8, 0.5)));
    let image_sink = graph.insert(Box::new(DisplaySinkNode::new(
        "image display",
        Box::new(display.clone()),
    )));
    let depth_sink = graph.insert(Box::new(DisplaySinkNode::new(
        "depth display",
        Box::new(display.clone()),
    )));
    let ir_sink = graph.insert(Box::new(DisplaySinkNode::new(
        "IR display",
        Box::new(display.clone()),
    )));

    graph
        .connect(capture_id, CaptureNode::OUT_IMAGE, fps_id, FpsOverlayNode::IN_IMAGE)
        .unwrap();
    graph
        .connect(fps_id, FpsOverlayNode::OUT_IMAGE, image_sink, DisplaySinkNode::IN_IMAGE)
        .unwrap();
    graph
        .connect(capture_id, CaptureNode::OUT_DEPTH, depth_sink, DisplaySinkNode::IN_IMAGE)
        .unwrap();
    graph
        .connect(capture_id, CaptureNode::OUT_IR, convert_id, ConvertNode::IN_IMAGE)
        .unwrap();
    graph
        .connect(convert_id, ConvertNode::OUT_IMAGE, ir_sink, DisplaySinkNode::IN_IMAGE)
        .unwrap();

    DemoGraph {
        sched: SingleThreaded::new(graph).unwrap(),
        handle,
        mode_history,
        display,
    }
}

#[test]
fn test_rgb_mode_feeds_image_and_depth_sinks() {
    let mut demo = build_demo_graph(StreamMode::DepthRgb);
    demo.sched.execute(10).unwrap();

    assert_eq!(demo.display.count("image display"), 10);
    assert_eq!(demo.display.count("depth display"), 10);
    assert_eq!(demo.display.count("IR display"), 0);
}

#[test]
fn test_ir_mode_feeds_converted_ir_sink() {
    let mut demo = build_demo_graph(StreamMode::DepthIr);
    demo.sched.execute(10).unwrap();

    assert_eq!(demo.display.count("image display"), 0);
    assert_eq!(demo.display.count("depth display"), 10);
    assert_eq!(demo.display.count("IR display"), 10);

    // IRシンクに届くフレームは変換済み
    let shown = demo.display.last("IR display").unwrap();
    assert_eq!(shown.format, PixelFormat::Gray8);
}

#[test]
fn test_image_sink_receives_fps_annotation() {
    let mut demo = build_demo_graph(StreamMode::DepthRgb);
    demo.sched.execute(3).unwrap();

    let shown = demo.display.last("image display").unwrap();
    let note = shown.annotation.expect("fps annotation present");
    assert!(note.starts_with("fps:"), "unexpected annotation: {}", note);
}

#[test]
fn test_batch_swap_alternates_stream_mode() {
    // バッチ実行とモード入れ替えを3往復以上繰り返し、
    // デバイスが観測したモードがバッチ単位で交互になることを確認する
    const BATCH: u64 = 10;
    let mut demo = build_demo_graph(StreamMode::DepthRgb);
    let mut next_mode = StreamMode::DepthIr;

    let mut expected = Vec::new();
    for batch in 0..6u64 {
        let current = demo.handle.get();
        demo.sched.execute(BATCH).unwrap();
        demo.handle.swap(&mut next_mode);
        expected.extend(std::iter::repeat(current).take(BATCH as usize));

        // 入れ替え後のハンドル値は直前のバッチと逆のモード
        assert_ne!(demo.handle.get(), current, "batch {}", batch);
    }

    let observed = demo.mode_history.lock().unwrap().clone();
    assert_eq!(observed, expected);

    // 交互: DepthRgb x10, DepthIr x10, DepthRgb x10, ...
    assert_eq!(observed[0], StreamMode::DepthRgb);
    assert_eq!(observed[BATCH as usize], StreamMode::DepthIr);
    assert_eq!(observed[2 * BATCH as usize], StreamMode::DepthRgb);
}

#[test]
fn test_sinks_follow_mode_across_toggles() {
    const BATCH: u64 = 10;
    let mut demo = build_demo_graph(StreamMode::DepthRgb);
    let mut next_mode = StreamMode::DepthIr;

    demo.sched.execute(BATCH).unwrap();
    demo.handle.swap(&mut next_mode);
    let image_after_first = demo.display.count("image display");
    assert_eq!(image_after_first, BATCH as usize);
    assert_eq!(demo.display.count("IR display"), 0);

    demo.sched.execute(BATCH).unwrap();
    demo.handle.swap(&mut next_mode);
    // IRバッチ中はimageシンクが増えない
    assert_eq!(demo.display.count("image display"), image_after_first);
    assert_eq!(demo.display.count("IR display"), BATCH as usize);

    demo.sched.execute(BATCH).unwrap();
    assert_eq!(demo.display.count("image display"), 2 * BATCH as usize);

    // 深度は全バッチで流れ続ける
    assert_eq!(demo.display.count("depth display"), 3 * BATCH as usize);
}
