use crate::context::Context;
use crate::progress::WaitProgress;
use crate::utils;
use clap::{Args, Subcommand, ValueEnum};
use cloudflow_aws::SqlLoginProbe;
use cloudflow_core::{
    Cloud, ConnectionParams, DB_AVAILABLE, DatabaseStatus, DbEngine, LoginProbe, Poller,
    RetryConfig, wait_for_login_ready,
};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Subcommand)]
pub enum RdsCommands {
    /// DB インスタンスの状態を表示
    Status {
        /// DB インスタンス識別子。省略時は全インスタンス
        ids: Vec<String>,
    },
    /// DB インスタンスを起動
    Start { id: String },
    /// DB インスタンスを停止
    Stop { id: String },
    /// DB インスタンスを再起動
    Reboot { id: String },
    /// インスタンスクラスを変更（即時適用）
    Resize {
        /// 新しいインスタンスクラス (例: db.r5.large)
        #[arg(long)]
        size: String,
        id: String,
        /// available になるまで待機する
        #[arg(long)]
        wait: bool,
    },
    /// 指定した状態になるまで待機
    Wait {
        id: String,
        #[arg(long, default_value = DB_AVAILABLE)]
        state: String,
    },
    /// 実際にログインできるまで待機
    WaitLogin(WaitLoginArgs),
}

#[derive(Args)]
pub struct WaitLoginArgs {
    /// 接続先ホスト
    #[arg(long, required_unless_present = "instance", conflicts_with = "instance")]
    host: Option<String>,
    /// RDS インスタンス識別子（エンドポイントとエンジンを RDS から取得）
    #[arg(long)]
    instance: Option<String>,
    /// DB エンジン（--host 指定時は必須）
    #[arg(long, value_enum, required_unless_present = "instance")]
    engine: Option<EngineArg>,
    /// ポート（省略時はエンジンの既定ポート）
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    user: String,
    #[arg(long, env = "CLOUDFLOW_DB_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    database: Option<String>,
    /// 試行間隔（秒）
    #[arg(long, default_value = "30")]
    interval: u64,
    /// 最大試行回数
    #[arg(long, default_value = "40")]
    attempts: u32,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum EngineArg {
    Postgres,
    Mysql,
}

impl From<EngineArg> for DbEngine {
    fn from(engine: EngineArg) -> Self {
        match engine {
            EngineArg::Postgres => DbEngine::Postgres,
            EngineArg::Mysql => DbEngine::MySql,
        }
    }
}

pub async fn handle(ctx: &Context, cmd: RdsCommands) -> anyhow::Result<()> {
    match cmd {
        RdsCommands::Status { ids } => {
            let cloud = ctx.cloud().await?;
            let records = if ids.is_empty() {
                cloud.database_status(None).await?
            } else {
                cloud.database_status_many(&ids).await?
            };
            if ctx.json {
                return utils::print_json(&records);
            }
            print_status_table(&records);
        }
        RdsCommands::Start { id } => {
            ctx.cloud().await?.start_database_instance(&id).await?;
            ctx.notice(format_args!("{} {}", "✓ 起動を要求しました:".green(), id.cyan()));
        }
        RdsCommands::Stop { id } => {
            ctx.cloud().await?.stop_database_instance(&id).await?;
            ctx.notice(format_args!("{} {}", "✓ 停止を要求しました:".green(), id.cyan()));
        }
        RdsCommands::Reboot { id } => {
            ctx.cloud().await?.reboot_database_instance(&id).await?;
            ctx.notice(format_args!("{} {}", "✓ 再起動を要求しました:".green(), id.cyan()));
        }
        RdsCommands::Resize { size, id, wait } => {
            let cloud = ctx.cloud().await?;
            cloud.resize_database_instance(&id, &size).await?;
            ctx.notice(format_args!(
                "{} {} → {}",
                "✓ インスタンスクラスの変更を要求しました:".green(),
                id.cyan(),
                size.cyan()
            ));
            if wait {
                wait_for_state(ctx, &cloud, &id, DB_AVAILABLE).await?;
            }
        }
        RdsCommands::Wait { id, state } => {
            let cloud = ctx.cloud().await?;
            wait_for_state(ctx, &cloud, &id, &state).await?;
        }
        // --host 指定時は RDS API を使わない
        RdsCommands::WaitLogin(args) => handle_wait_login(ctx, args).await?,
    }

    Ok(())
}

async fn wait_for_state(
    ctx: &Context,
    cloud: &Cloud,
    id: &str,
    state: &str,
) -> anyhow::Result<()> {
    let (cloud, progress) = utils::with_progress(cloud, &format!("{} が {} になるのを待機中...", id, state));
    match cloud.wait_for_database_state(id, state).await {
        Ok(db) => {
            progress.finish_success(&format!("{} は {} です", id, state));
            if ctx.json {
                utils::print_json(&DatabaseStatus::from(&db))?;
            }
            Ok(())
        }
        Err(e) => {
            progress.finish_error(&e.to_string());
            Err(e.into())
        }
    }
}

async fn handle_wait_login(ctx: &Context, args: WaitLoginArgs) -> anyhow::Result<()> {
    let (host, engine, port) = match (&args.instance, args.host) {
        (Some(instance), _) => {
            // available を待ってからエンドポイントを取得
            let cloud = ctx.cloud().await?;
            let (waiting, progress) =
                utils::with_progress(&cloud, &format!("{} が available になるのを待機中...", instance));
            let db = match waiting.wait_for_database_state(instance, DB_AVAILABLE).await {
                Ok(db) => {
                    progress.finish_success(&format!("{} は available です", instance));
                    db
                }
                Err(e) => {
                    progress.finish_error(&e.to_string());
                    return Err(e.into());
                }
            };

            let endpoint = db
                .endpoint
                .ok_or_else(|| anyhow::anyhow!("{} のエンドポイントがまだありません", instance))?;
            let engine = match args.engine {
                Some(engine) => DbEngine::from(engine),
                None => db
                    .engine
                    .as_deref()
                    .and_then(DbEngine::from_engine_name)
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "{} のエンジン ({}) はログイン確認に対応していません。--engine で指定してください",
                            instance,
                            db.engine.as_deref().unwrap_or("不明")
                        )
                    })?,
            };
            (endpoint.host, engine, args.port.unwrap_or(endpoint.port))
        }
        (None, Some(host)) => {
            let engine = args
                .engine
                .map(DbEngine::from)
                .ok_or_else(|| anyhow::anyhow!("--host を使う場合は --engine を指定してください"))?;
            let port = args.port.unwrap_or(engine.default_port());
            (host, engine, port)
        }
        (None, None) => anyhow::bail!("--host または --instance を指定してください"),
    };

    let probe = SqlLoginProbe::new(ConnectionParams {
        engine,
        host,
        port,
        username: args.user,
        password: args.password,
        database: args.database,
    });
    let config = RetryConfig::fixed(Duration::from_secs(args.interval), args.attempts);

    let progress = WaitProgress::new(&format!("{} へのログインを待機中...", probe.describe()));
    let poller = Poller::new(Arc::new(progress.clone()), ctx.cancellation());

    match wait_for_login_ready(&poller, &probe, &config).await {
        Ok(attempts) => {
            progress.finish_success(&format!("ログインできました ({} 回目)", attempts));
            Ok(())
        }
        Err(e) => {
            progress.finish_error(&e.to_string());
            Err(e.into())
        }
    }
}

fn print_status_table(records: &[DatabaseStatus]) {
    if records.is_empty() {
        println!("{}", "該当する DB インスタンスはありません".dimmed());
        return;
    }

    println!(
        "{}",
        format!("{:<28} {:<14} {:<56} {:<16}", "NAME", "STATE", "ADDRESS", "SIZE").bold()
    );
    println!("{}", "─".repeat(116).dimmed());

    for r in records {
        println!(
            "{:<28} {:<14} {:<56} {:<16}",
            r.name,
            utils::colored_db_status(&r.state),
            r.address.as_deref().unwrap_or("-"),
            r.size
        );
    }
}
