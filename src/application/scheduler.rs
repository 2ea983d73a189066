//! シングルスレッドスケジューラ
//!
//! グラフを依存順に毎ティック1回ずつ実行する。execute(niter)は
//! niterティック実行したら呼び出し元へ制御を返す（固定バッチ実行）。
//!
//! # 実行セマンティクス
//! - エッジは「最新のみ」の1スロットメールボックス。下流が遅い場合は
//!   古いパケットが上書きされる。
//! - 接続済み入力を持つノードは、そのティックに何も届かなければスキップ。
//!   ソースノード（入力なし）は毎ティック実行される。
//! - ノードのエラーは原則ログして続行。致命的エラー
//!   （ReInitializationRequired / Initialization）のみ伝播する。

use crate::application::graph::Graph;
use crate::application::node::{NodeIo, Packet};
use crate::application::stats::StatsCollector;
use crate::domain::{DomainError, DomainResult};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// シングルスレッドのグラフスケジューラ
pub struct SingleThreaded {
    graph: Graph,
    /// 依存順の実行順序（構築時に確定）
    order: Vec<usize>,
    /// エッジのメールボックス: (宛先ノード, 入力ポート) -> 最新パケット
    mailboxes: HashMap<(usize, String), Packet>,
    stats: StatsCollector,
    /// 前ティックまでに統計へ取り込んだノードごとの再初期化回数
    reinit_seen: HashMap<usize, u64>,
}

impl SingleThreaded {
    /// グラフからスケジューラを構築する
    ///
    /// # Errors
    /// グラフに循環がある場合は `DomainError::Graph`
    pub fn new(graph: Graph) -> DomainResult<Self> {
        Self::with_stats_interval(graph, Duration::from_secs(10))
    }

    /// 統計出力間隔を指定して構築する
    pub fn with_stats_interval(graph: Graph, stats_interval: Duration) -> DomainResult<Self> {
        let order = graph.topo_order()?;
        tracing::debug!(
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            "Scheduler constructed"
        );
        Ok(Self {
            graph,
            order,
            mailboxes: HashMap::new(),
            stats: StatsCollector::new(stats_interval),
            reinit_seen: HashMap::new(),
        })
    }

    /// niterティック実行して制御を返す
    ///
    /// # Errors
    /// ノードが致命的エラーを返した場合のみ（それ以外のノードエラーは
    /// 警告ログを出して続行する）
    pub fn execute(&mut self, niter: u64) -> DomainResult<()> {
        for _ in 0..niter {
            self.tick()?;
            if self.stats.should_report() {
                self.stats.report_and_reset();
            }
        }
        Ok(())
    }

    /// 1ティック: 全ノードを依存順に1回ずつ実行する
    fn tick(&mut self) -> DomainResult<()> {
        for &idx in &self.order {
            let is_source = !self.graph.has_connected_inputs(idx);

            // このノード宛のメールボックスを回収
            let mut inputs: HashMap<String, Packet> = HashMap::new();
            for conn in &self.graph.connections {
                if conn.to == idx {
                    if let Some(packet) = self.mailboxes.remove(&(idx, conn.in_port.clone())) {
                        inputs.insert(conn.in_port.clone(), packet);
                    }
                }
            }

            // 接続済み入力に何も届いていなければこのティックはスキップ
            if !is_source && inputs.is_empty() {
                continue;
            }

            let mut io = NodeIo::new(inputs);
            let started = Instant::now();
            let result = self.graph.nodes[idx].process(&mut io);
            let node_name = self.graph.nodes[idx].name().to_string();
            self.stats.record_duration(&node_name, started.elapsed());

            // ノードが試行した再初期化の差分を統計へ取り込む
            // （エラーで終わったパスの分も落とさない）
            let reinit_total = self.graph.nodes[idx].reinitializations();
            let seen = self.reinit_seen.entry(idx).or_insert(0);
            if reinit_total > *seen {
                self.stats.record_reinitializations(reinit_total - *seen);
                *seen = reinit_total;
            }

            match result {
                Ok(()) => {
                    if is_source && io.emitted_count() > 0 {
                        self.stats.record_frame();
                    }
                }
                Err(e) if Self::is_fatal(&e) => {
                    tracing::error!("Node '{}' failed fatally: {:?}", node_name, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Node '{}' error (pass dropped): {:?}", node_name, e);
                    continue;
                }
            }

            // 出力を下流メールボックスへ配送（最新のみ上書き）
            for (out_port, packet) in io.into_outputs() {
                for conn in &self.graph.connections {
                    if conn.from == idx && conn.out_port == out_port {
                        self.mailboxes
                            .insert((conn.to, conn.in_port.clone()), packet.clone());
                    }
                }
                // 未接続ポートへの送出はここで破棄される
            }
        }

        self.stats.record_tick();
        Ok(())
    }

    fn is_fatal(error: &DomainError) -> bool {
        matches!(
            error,
            DomainError::ReInitializationRequired | DomainError::Initialization(_)
        )
    }

    /// 収集済み統計への参照
    pub fn stats(&self) -> &StatsCollector {
        &self.stats
    }
}
