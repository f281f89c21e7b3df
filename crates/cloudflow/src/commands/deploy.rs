use crate::context::Context;
use crate::utils;
use clap::{Args, Subcommand};
use cloudflow_core::{
    BundleType, Cloud, DeploymentGroupInfo, DeploymentHandle, DeploymentOutcome, FailureSummary,
    Revision, TagFilter,
};
use colored::Colorize;

#[derive(Subcommand)]
pub enum DeployCommands {
    /// デプロイを作成し、完了まで待機
    Run(RunArgs),
    /// 既存デプロイの失敗内容を表示
    Summarize {
        #[arg(long)]
        app: String,
        #[arg(long)]
        group: String,
        deployment_id: String,
    },
    /// デプロイグループを操作
    #[command(subcommand)]
    Group(GroupCommands),
}

#[derive(Args)]
pub struct RunArgs {
    /// アプリケーション名
    #[arg(long)]
    app: String,
    /// デプロイグループ名
    #[arg(long)]
    group: String,
    /// リビジョンを置いた S3 バケット
    #[arg(long, requires = "key", conflicts_with = "repository")]
    bucket: Option<String>,
    /// S3 オブジェクトキー
    #[arg(long)]
    key: Option<String>,
    /// バンドル形式 (tar, tgz, zip, yaml, json)
    #[arg(long, default_value = "zip")]
    bundle_type: BundleType,
    /// S3 オブジェクトバージョン
    #[arg(long)]
    version: Option<String>,
    /// S3 オブジェクト ETag
    #[arg(long)]
    etag: Option<String>,
    /// GitHub リポジトリ (owner/name)
    #[arg(long, requires = "commit")]
    repository: Option<String>,
    /// GitHub コミット ID
    #[arg(long)]
    commit: Option<String>,
    /// 作成後すぐに終了する
    #[arg(long)]
    no_wait: bool,
}

impl RunArgs {
    fn revision(&self) -> anyhow::Result<Revision> {
        match (&self.bucket, &self.key, &self.repository, &self.commit) {
            (Some(bucket), Some(key), None, _) => Ok(Revision::S3 {
                bucket: bucket.clone(),
                key: key.clone(),
                bundle_type: self.bundle_type,
                version: self.version.clone(),
                etag: self.etag.clone(),
            }),
            (None, _, Some(repository), Some(commit)) => Ok(Revision::GitHub {
                repository: repository.clone(),
                commit_id: commit.clone(),
            }),
            _ => anyhow::bail!(
                "リビジョンを指定してください: --bucket/--key または --repository/--commit"
            ),
        }
    }
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// デプロイグループの設定を表示
    Show {
        #[arg(long)]
        app: String,
        #[arg(long)]
        group: String,
    },
    /// EC2 タグフィルタを置き換える
    SetFilter {
        #[arg(long)]
        app: String,
        #[arg(long)]
        group: String,
        /// KEY=VALUE, KEY (キーのみ), =VALUE (値のみ)
        #[arg(long = "tag", required = true)]
        tags: Vec<TagFilter>,
    },
}

pub async fn handle(ctx: &Context, cmd: DeployCommands) -> anyhow::Result<()> {
    match cmd {
        DeployCommands::Run(args) => {
            // 接続前に引数を検証
            let revision = args.revision()?;
            let cloud = ctx.cloud().await?;
            run(ctx, &cloud, &args, &revision).await
        }
        DeployCommands::Summarize {
            app,
            group,
            deployment_id,
        } => {
            let cloud = ctx.cloud().await?;
            let handle = DeploymentHandle {
                deployment_id,
                application: app,
                group,
            };
            let summary = cloud.summarize_failures(&handle).await?;
            print_summary(ctx, &summary)
        }
        DeployCommands::Group(GroupCommands::Show { app, group }) => {
            let cloud = ctx.cloud().await?;
            let info = cloud.deployment_group(&app, &group).await?;
            if ctx.json {
                return utils::print_json(&info);
            }
            print_group(&info);
            Ok(())
        }
        DeployCommands::Group(GroupCommands::SetFilter { app, group, tags }) => {
            let cloud = ctx.cloud().await?;
            cloud
                .update_deployment_group_filter(&app, &group, &tags)
                .await?;
            ctx.notice(format_args!(
                "{} {}/{} ({} 件)",
                "✓ タグフィルタを更新しました:".green(),
                app.cyan(),
                group.cyan(),
                tags.len()
            ));
            Ok(())
        }
    }
}

async fn run(
    ctx: &Context,
    cloud: &Cloud,
    args: &RunArgs,
    revision: &Revision,
) -> anyhow::Result<()> {
    ctx.notice(format_args!(
        "{} {} → {}",
        "デプロイを開始します:".blue().bold(),
        args.app.cyan(),
        args.group.cyan()
    ));

    let handle = cloud.start_deployment(&args.app, &args.group, revision).await?;
    ctx.notice(format_args!("デプロイ ID: {}", handle.deployment_id.cyan()));

    if args.no_wait {
        if ctx.json {
            utils::print_json(&handle)?;
        }
        return Ok(());
    }

    let (waiting, progress) = utils::with_progress(cloud, "デプロイの完了を待機中...");
    let outcome = match waiting.await_deployment_outcome(&handle).await {
        Ok(outcome) => outcome,
        Err(e) => {
            progress.finish_error(&e.to_string());
            return Err(e.into());
        }
    };

    match outcome {
        DeploymentOutcome::Succeeded => {
            progress.finish_success("デプロイが完了しました");
            if ctx.json {
                utils::print_json(&handle)?;
            }
            Ok(())
        }
        DeploymentOutcome::Failed(status) => {
            progress.finish_error(&format!("デプロイが {} で終了しました", status));
            let summary = cloud.summarize_failures(&handle).await?;
            print_summary(ctx, &summary)?;
            anyhow::bail!("デプロイ {} は失敗しました", handle.deployment_id)
        }
    }
}

fn print_summary(ctx: &Context, summary: &FailureSummary) -> anyhow::Result<()> {
    if ctx.json {
        return utils::print_json(summary);
    }
    if summary.is_empty() {
        println!("{}", "失敗したインスタンスはありません".dimmed());
        return Ok(());
    }
    println!();
    print!("{}", summary.to_string().red());
    Ok(())
}

fn print_group(info: &DeploymentGroupInfo) {
    println!("{}", format!("{}/{}", info.application, info.group_name).bold());
    println!("  ID:             {}", info.group_id.as_deref().unwrap_or("-"));
    println!(
        "  サービスロール: {}",
        info.service_role_arn.as_deref().unwrap_or("-")
    );
    println!(
        "  デプロイ設定:   {}",
        info.deployment_config_name.as_deref().unwrap_or("-")
    );
    println!("  EC2 タグフィルタ:");
    if info.ec2_tag_filters.is_empty() {
        println!("    {}", "(なし)".dimmed());
    }
    for filter in &info.ec2_tag_filters {
        println!(
            "    {}={} ({})",
            filter.key.as_deref().unwrap_or(""),
            filter.value.as_deref().unwrap_or(""),
            filter.filter_type.as_str().dimmed()
        );
    }
}
