use crate::context::Context;
use crate::progress::WaitProgress;
use clap::Subcommand;
use cloudflow_core::{Poller, ReachabilityConfig, wait_for_tcp_reachable};
use std::sync::Arc;
use std::time::Duration;

#[derive(Subcommand)]
pub enum NetCommands {
    /// TCP 接続してデータを受信できるまで待機
    Wait {
        host: String,
        port: u16,
        /// 制限時間（分）。試行回数はこの 2 倍
        #[arg(long, default_value = "20")]
        minutes: u32,
        /// 再試行までの間隔（秒）
        #[arg(long, default_value = "30")]
        interval: u64,
    },
}

pub async fn handle(ctx: &Context, cmd: NetCommands) -> anyhow::Result<()> {
    match cmd {
        NetCommands::Wait {
            host,
            port,
            minutes,
            interval,
        } => {
            let config = ReachabilityConfig {
                time_limit_minutes: minutes,
                retry_interval: Duration::from_secs(interval),
            };
            let progress = WaitProgress::new(&format!("{}:{} への接続を待機中...", host, port));
            let poller = Poller::new(Arc::new(progress.clone()), ctx.cancellation());

            match wait_for_tcp_reachable(&poller, &host, port, &config).await {
                Ok(attempts) => {
                    progress.finish_success(&format!(
                        "{}:{} に接続できました ({} 回目)",
                        host, port, attempts
                    ));
                    Ok(())
                }
                Err(e) => {
                    progress.finish_error(&e.to_string());
                    Err(e.into())
                }
            }
        }
    }
}
