use cloudflow_aws::AwsProvider;
use cloudflow_config::{CredentialMode, resolve_credentials};
use cloudflow_core::{CancellationToken, Cloud, Observer, TracingObserver};
use colored::Colorize;
use std::sync::Arc;

/// コマンド共通の実行コンテキスト
pub struct Context {
    pub json: bool,
    strict: bool,
    cancel: CancellationToken,
}

impl Context {
    pub fn new(strict: bool, json: bool) -> Self {
        Self {
            json,
            strict,
            cancel: cancel_on_ctrl_c(),
        }
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 人向けのメッセージを stdout に出力（--json 指定時は出さない）
    pub fn notice(&self, message: impl std::fmt::Display) {
        if !self.json {
            println!("{}", message);
        }
    }

    /// 認証情報を解決して AWS に接続
    ///
    /// AWS を使うコマンドだけが呼ぶ。
    pub async fn cloud(&self) -> anyhow::Result<Cloud> {
        let mode = CredentialMode::from_strict_flag(self.strict);
        tracing::debug!("Resolving AWS credentials ({:?})", mode);
        let credentials = resolve_credentials(mode).map_err(|e| {
            eprintln!("{}", "✗ AWS 認証情報の解決に失敗しました".red().bold());
            e
        })?;

        let observer: Arc<dyn Observer> = Arc::new(TracingObserver);
        let provider = AwsProvider::connect(&credentials, observer.as_ref()).await;
        tracing::debug!(
            "Connected to AWS (region: {})",
            credentials.region().unwrap_or("default chain")
        );

        Ok(Cloud::new(Arc::new(provider))
            .with_observer(observer)
            .with_cancellation(self.cancel.clone()))
    }
}

/// Ctrl-C で待機中の処理を中断するトークン
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, cancelling");
            eprintln!("\n{}", "中断しています...".yellow());
            token.cancel();
        }
    });
    cancel
}
