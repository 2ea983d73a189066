//! Application Layer
//!
//! グラフ実行エンジンと組み込みノードを実装します。
//!
//! ## モジュール構成
//! - `node`: ノード抽象（名前付きポート、ティックごとのprocess）
//! - `graph`: ノード登録とポート接続の検証
//! - `scheduler`: シングルスレッドのバッチ実行（execute(niter)）
//! - `nodes`: 組み込みノード（capture/fps_overlay/convert/display）
//! - `recovery`: キャプチャ再初期化ロジック（指数バックオフ）
//! - `stats`: 統計情報管理（FPS、ノード別レイテンシ、再初期化回数）

pub mod graph;
pub mod node;
pub mod nodes;
pub mod recovery;
pub mod scheduler;
pub mod stats;
