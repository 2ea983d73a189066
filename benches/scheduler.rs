//! スケジューラのスループット計測
//!
//! モックキャプチャを使い、デモ相当のグラフを1バッチ（100ティック）
//! 実行するコストを計測する。

use criterion::{criterion_group, criterion_main, Criterion};
use depthflow::application::graph::Graph;
use depthflow::application::nodes::{CaptureNode, ConvertNode, DisplaySinkNode, FpsOverlayNode};
use depthflow::application::recovery::RecoveryState;
use depthflow::application::scheduler::SingleThreaded;
use depthflow::domain::{PixelFormat, StreamMode};
use depthflow::infrastructure::{LogDisplayAdapter, MockCaptureAdapter};

fn build_scheduler(width: u32, height: u32) -> SingleThreaded {
    let adapter = MockCaptureAdapter::new(StreamMode::DepthRgb, width, height);
    let capture = CaptureNode::new(Box::new(adapter), RecoveryState::with_default_policy());

    let mut graph = Graph::new();
    let capture_id = graph.insert(Box::new(capture));
    let fps_id = graph.insert(Box::new(FpsOverlayNode::new("fps")));
    let convert_id = graph.insert(Box::new(ConvertNode::new(PixelFormat::Gray8, 0.5)));
    let image_sink = graph.insert(Box::new(DisplaySinkNode::new(
        "image display",
        Box::new(LogDisplayAdapter::new()),
    )));
    let depth_sink = graph.insert(Box::new(DisplaySinkNode::new(
        "depth display",
        Box::new(LogDisplayAdapter::new()),
    )));
    let ir_sink = graph.insert(Box::new(DisplaySinkNode::new(
        "IR display",
        Box::new(LogDisplayAdapter::new()),
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

    SingleThreaded::new(graph).unwrap()
}

fn bench_batch_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_batch");

    for (label, width, height) in [("qvga", 320u32, 240u32), ("vga", 640, 480)] {
        group.bench_function(label, |b| {
            let mut sched = build_scheduler(width, height);
            b.iter(|| sched.execute(100).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_batch_execution);
criterion_main!(benches);
