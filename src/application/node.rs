//! ノード抽象
//!
//! グラフの計算単位。名前付きの入出力ポートを宣言し、
//! スケジューラのティックごとに1回のprocess()を実行する。

use crate::domain::{DomainResult, Image};
use std::collections::HashMap;
use std::sync::Arc;

/// エッジを流れるパケット
///
/// フレームは複数の下流へ配られるため共有所有にする。
pub type Packet = Arc<Image>;

/// 1ティック分の入出力の受け渡し
///
/// スケジューラが保留中の入力パケットを詰めて渡し、
/// ノードがemit()した出力を回収して下流メールボックスへ配送する。
pub struct NodeIo {
    inputs: HashMap<String, Packet>,
    outputs: Vec<(String, Packet)>,
}

impl NodeIo {
    pub(crate) fn new(inputs: HashMap<String, Packet>) -> Self {
        Self {
            inputs,
            outputs: Vec::new(),
        }
    }

    /// 入力ポートのパケットを取り出す（このティックに届いていなければNone）
    pub fn take(&mut self, port: &str) -> Option<Packet> {
        self.inputs.remove(port)
    }

    /// 保留中の入力があるか
    pub fn has_pending_input(&self) -> bool {
        !self.inputs.is_empty()
    }

    /// 出力ポートへパケットを送出する
    ///
    /// 未接続のポートへの送出は配送時に単に破棄される。
    pub fn emit(&mut self, port: impl Into<String>, packet: Packet) {
        self.outputs.push((port.into(), packet));
    }

    /// 送出された出力の数
    pub fn emitted_count(&self) -> usize {
        self.outputs.len()
    }

    pub(crate) fn into_outputs(self) -> Vec<(String, Packet)> {
        self.outputs
    }
}

/// グラフの計算単位
///
/// 入出力ポートは宣言制: connect()時に検証され、宣言外のポート名は
/// 接続エラーになる。入力ポートを持たないノードはソースとして扱われ、
/// 毎ティック必ず実行される。
pub trait Node: Send {
    /// ノード名（ログ・統計のキー）
    fn name(&self) -> &str;

    /// 宣言する入力ポート名
    fn inputs(&self) -> &[&str] {
        &[]
    }

    /// 宣言する出力ポート名
    fn outputs(&self) -> &[&str] {
        &[]
    }

    /// 1ティック分の処理を実行する
    fn process(&mut self, io: &mut NodeIo) -> DomainResult<()>;

    /// このノードが試行したデバイス再初期化の回数
    ///
    /// 復旧ロジックを持つソースノードが上書きする。スケジューラが
    /// ティックごとに差分を統計へ取り込む。
    fn reinitializations(&self) -> u64 {
        0
    }
}
