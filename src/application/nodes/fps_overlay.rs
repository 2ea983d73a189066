//! FPSオーバーレイノード
//!
//! 画像ストリームにフレームレート表示の注釈を付けて再送出する。
//! 描画そのものはGUIレイヤの仕事なので、ここではフレームの
//! annotationフィールドに文字列を載せるだけにする（表示側が描く）。

use crate::application::node::{Node, NodeIo};
use crate::application::stats::FpsCounter;
use crate::domain::DomainResult;
use std::sync::Arc;

/// FPSオーバーレイノード
///
/// 構築時に与えた名前が注釈のラベルになる（例: "fps: 29.7 fps"）。
pub struct FpsOverlayNode {
    label: String,
    counter: FpsCounter,
}

impl FpsOverlayNode {
    pub const IN_IMAGE: &'static str = "image";
    pub const OUT_IMAGE: &'static str = "image";

    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            counter: FpsCounter::new(),
        }
    }

    /// 現在の計測値
    pub fn current_fps(&self) -> f64 {
        self.counter.fps()
    }
}

impl Node for FpsOverlayNode {
    fn name(&self) -> &str {
        &self.label
    }

    fn inputs(&self) -> &[&str] {
        &[Self::IN_IMAGE]
    }

    fn outputs(&self) -> &[&str] {
        &[Self::OUT_IMAGE]
    }

    fn process(&mut self, io: &mut NodeIo) -> DomainResult<()> {
        let Some(packet) = io.take(Self::IN_IMAGE) else {
            return Ok(());
        };

        self.counter.record();

        let mut annotated = (*packet).clone();
        annotated.annotation = Some(format!("{}: {:.1} fps", self.label, self.counter.fps()));
        io.emit(Self::OUT_IMAGE, Arc::new(annotated));
        Ok(())
    }
}
