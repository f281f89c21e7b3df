mod commands;
mod context;
mod progress;
mod utils;

use clap::{Parser, Subcommand};
use commands::{
    ddb::DdbCommands, deploy::DeployCommands, ec2::Ec2Commands, net::NetCommands,
    rds::RdsCommands,
};
use context::Context;

#[derive(Parser)]
#[command(name = "cflow")]
#[command(about = "EC2 / RDS / CodeDeploy / DynamoDB をまとめて操作する", long_about = None)]
struct Cli {
    /// 環境変数の認証情報が揃っていなければ失敗する（IAM ロールへのフォールバックなし）
    #[arg(long, global = true, env = "CLOUDFLOW_STRICT_CREDENTIALS")]
    strict: bool,

    /// 結果を JSON で出力
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// EC2 インスタンスを操作
    #[command(subcommand)]
    Ec2(Ec2Commands),
    /// RDS インスタンスを操作
    #[command(subcommand)]
    Rds(RdsCommands),
    /// CodeDeploy デプロイを操作
    #[command(subcommand)]
    Deploy(DeployCommands),
    /// DynamoDB テーブルを操作
    #[command(subcommand)]
    Ddb(DdbCommands),
    /// ネットワーク疎通を確認
    #[command(subcommand)]
    Net(NetCommands),
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr、結果は stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Versionコマンドは認証情報不要
    if matches!(cli.command, Commands::Version) {
        println!("cloudflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let ctx = Context::new(cli.strict, cli.json);
    tracing::debug!(strict = cli.strict, json = cli.json, "Dispatching command");

    match cli.command {
        Commands::Ec2(cmd) => commands::ec2::handle(&ctx, cmd).await,
        Commands::Rds(cmd) => commands::rds::handle(&ctx, cmd).await,
        Commands::Deploy(cmd) => commands::deploy::handle(&ctx, cmd).await,
        Commands::Ddb(cmd) => commands::ddb::handle(&ctx, cmd).await,
        Commands::Net(cmd) => commands::net::handle(&ctx, cmd).await,
        Commands::Version => Ok(()),
    }
}
