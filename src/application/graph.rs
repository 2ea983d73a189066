//! グラフ構築
//!
//! ノードの登録とポート間の有向接続を管理する。
//! 接続はconnect()時に検証され、実行順序はスケジューラ構築時に確定する。

use crate::application::node::Node;
use crate::domain::{DomainError, DomainResult};

/// グラフ内ノードの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// ポート間の有向接続
#[derive(Debug, Clone)]
pub(crate) struct Connection {
    pub from: usize,
    pub out_port: String,
    pub to: usize,
    pub in_port: String,
}

/// ノードと接続の集合（dataflow graph）
pub struct Graph {
    pub(crate) nodes: Vec<Box<dyn Node>>,
    pub(crate) connections: Vec<Connection>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// 空のグラフを作成
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// ノードを登録する
    pub fn insert(&mut self, node: Box<dyn Node>) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// 出力ポートを入力ポートへ接続する
    ///
    /// # Errors
    /// - どちらかのノードIDが不正
    /// - ポート名が宣言されていない
    /// - 入力ポートに既に上流がある（入力は単一書き込み）
    pub fn connect(
        &mut self,
        from: NodeId,
        out_port: &str,
        to: NodeId,
        in_port: &str,
    ) -> DomainResult<()> {
        let from_node = self
            .nodes
            .get(from.0)
            .ok_or_else(|| DomainError::Graph(format!("Unknown source node id {}", from.0)))?;
        let to_node = self
            .nodes
            .get(to.0)
            .ok_or_else(|| DomainError::Graph(format!("Unknown target node id {}", to.0)))?;

        if !from_node.outputs().contains(&out_port) {
            return Err(DomainError::Graph(format!(
                "Node '{}' has no output port '{}'",
                from_node.name(),
                out_port
            )));
        }
        if !to_node.inputs().contains(&in_port) {
            return Err(DomainError::Graph(format!(
                "Node '{}' has no input port '{}'",
                to_node.name(),
                in_port
            )));
        }
        if self
            .connections
            .iter()
            .any(|c| c.to == to.0 && c.in_port == in_port)
        {
            return Err(DomainError::Graph(format!(
                "Input port '{}' of node '{}' is already connected",
                in_port,
                to_node.name()
            )));
        }

        self.connections.push(Connection {
            from: from.0,
            out_port: out_port.to_string(),
            to: to.0,
            in_port: in_port.to_string(),
        });
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// ノードが接続済みの入力を1つでも持つか
    pub(crate) fn has_connected_inputs(&self, idx: usize) -> bool {
        self.connections.iter().any(|c| c.to == idx)
    }

    /// 依存順のトポロジカル順序を計算する（Kahn法）
    ///
    /// # Errors
    /// 循環がある場合は `DomainError::Graph`
    pub(crate) fn topo_order(&self) -> DomainResult<Vec<usize>> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        for conn in &self.connections {
            in_degree[conn.to] += 1;
        }

        // 挿入順を保ちつつ、依存のないノードから順に取り出す
        let mut ready: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(idx) = ready.first().copied() {
            ready.remove(0);
            order.push(idx);
            for conn in &self.connections {
                if conn.from == idx {
                    in_degree[conn.to] -= 1;
                    if in_degree[conn.to] == 0 {
                        ready.push(conn.to);
                    }
                }
            }
        }

        if order.len() != n {
            let stuck: Vec<&str> = (0..n)
                .filter(|i| !order.contains(i))
                .map(|i| self.nodes[i].name())
                .collect();
            return Err(DomainError::Graph(format!(
                "Graph contains a cycle involving: {}",
                stuck.join(", ")
            )));
        }
        Ok(order)
    }
}
