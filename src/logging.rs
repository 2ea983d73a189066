/// ログ・トレーシング基盤
///
/// tracingを使用した統一的なログ出力と区間計測。
/// ファイル出力時はtracing-appenderの非同期書き込みを使い、
/// グラフ実行スレッドへの影響を最小化する。

use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ログシステムを初期化
///
/// # Arguments
/// - `log_level`: ログレベル（"info", "debug", "trace"等、RUST_LOGが優先）
/// - `json_format`: JSON形式で出力するか
/// - `log_dir`: ログファイル出力先（None = 標準出力）
///
/// # Returns
/// ファイル出力時は`Some(WorkerGuard)`を返す。Dropでログスレッドが
/// フラッシュされるため、main関数終了まで保持すること。
pub fn init_logging(
    log_level: &str,
    json_format: bool,
    log_dir: Option<PathBuf>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match log_dir {
        Some(dir) => {
            if std::fs::create_dir_all(&dir).is_err() {
                return None;
            }

            let file_appender = tracing_appender::rolling::daily(dir, "depthflow.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let subscriber = tracing_subscriber::registry().with(env_filter);

            let result = if json_format {
                subscriber
                    .with(fmt::layer().json().with_writer(non_blocking))
                    .try_init()
            } else {
                subscriber
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_thread_ids(true)
                            .with_line_number(true)
                            .with_ansi(false) // ファイル出力時はANSIエスケープ無効
                            .with_writer(non_blocking),
                    )
                    .try_init()
            };

            if result.is_err() {
                return None;
            }

            info!(
                "Logging initialized (async file): level={}, format={}",
                log_level,
                if json_format { "json" } else { "text" }
            );
            Some(guard)
        }
        None => {
            let subscriber = tracing_subscriber::registry().with(env_filter);

            let result = if json_format {
                subscriber.with(fmt::layer().json()).try_init()
            } else {
                subscriber
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_thread_ids(true)
                            .with_line_number(true),
                    )
                    .try_init()
            };

            if result.is_ok() {
                info!(
                    "Logging initialized (stdout): level={}, format={}",
                    log_level,
                    if json_format { "json" } else { "text" }
                );
            }
            None
        }
    }
}

/// 区間計測用のマクロ
///
/// Release ビルド時は完全にコンパイルアウト（ゼロコスト）。
/// Debug ビルド時のみ計測を実行する。
///
/// # 使用例
/// ```ignore
/// use depthflow::measure_span;
///
/// fn run_batch() {
///     measure_span!("run_batch", {
///         // 処理内容
///     });
/// }
/// ```
#[macro_export]
macro_rules! measure_span {
    ($name:expr, $body:expr) => {
        #[cfg(debug_assertions)]
        {
            let _span = tracing::info_span!($name).entered();
            let _start = std::time::Instant::now();
            let result = $body;
            let _elapsed = _start.elapsed();
            tracing::debug!(
                span = $name,
                elapsed_us = _elapsed.as_micros(),
                "Span completed"
            );
            result
        }
        #[cfg(not(debug_assertions))]
        {
            $body
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_span_exported_at_crate_root() {
        // マクロはクレートルートにエクスポートされる（useによる再定義は不要）
        let mut executed = false;
        crate::measure_span!("test_span", {
            executed = true;
        });
        assert!(executed);
    }

    #[test]
    fn test_init_logging_stdout() {
        // 標準出力モード（デバッグ用）
        let guard = init_logging("debug", false, None);
        assert!(guard.is_none());

        tracing::info!("Test log message");
        // ログが出力されることを確認（エラーにならないこと）
    }

    #[test]
    fn test_init_logging_file() {
        let temp_dir = std::env::temp_dir().join("depthflow_test_logs");

        // グローバルsubscriberが既に設定されている場合はスキップ
        // （他のテストで設定済みの可能性がある）
        let guard = init_logging("info", false, Some(temp_dir.clone()));

        if guard.is_none() {
            return;
        }

        assert!(temp_dir.exists());

        tracing::info!("Test file log");

        // guardをDropしてログをフラッシュ
        drop(guard);

        let log_files: Vec<_> = std::fs::read_dir(&temp_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(!log_files.is_empty(), "Log file should be created");

        std::fs::remove_dir_all(temp_dir).ok();
    }
}
