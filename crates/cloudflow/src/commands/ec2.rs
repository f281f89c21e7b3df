use crate::context::Context;
use crate::utils;
use clap::{Subcommand, ValueEnum};
use cloudflow_core::{ComputeStatus, InstanceState, Target};
use colored::Colorize;

#[derive(Subcommand)]
pub enum Ec2Commands {
    /// インスタンスの状態を表示
    Status {
        /// Name タグ（--env 指定時は Environment タグ）。省略時は全インスタンス
        targets: Vec<String>,
        /// TARGETS を Environment タグとして扱う
        #[arg(long)]
        env: bool,
    },
    /// インスタンスを起動
    Start {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// インスタンスを停止
    Stop {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// インスタンスを再起動
    Reboot {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// インスタンスタイプを変更（起動中なら停止→変更→起動）
    Resize {
        /// 新しいインスタンスタイプ (例: m5.large)
        #[arg(long)]
        size: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// 指定した状態になるまで待機
    Wait {
        #[arg(long, value_enum)]
        state: WaitState,
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WaitState {
    Running,
    Stopped,
}

impl From<WaitState> for InstanceState {
    fn from(state: WaitState) -> Self {
        match state {
            WaitState::Running => InstanceState::Running,
            WaitState::Stopped => InstanceState::Stopped,
        }
    }
}

pub async fn handle(ctx: &Context, cmd: Ec2Commands) -> anyhow::Result<()> {
    let cloud = ctx.cloud().await?;

    match cmd {
        Ec2Commands::Status { targets, env } => {
            let targets: Vec<Target> = if targets.is_empty() {
                vec![Target::All]
            } else if env {
                targets.into_iter().map(Target::environment).collect()
            } else {
                targets.into_iter().map(Target::name).collect()
            };

            let records = cloud.compute_status_many(&targets).await?;
            if ctx.json {
                return utils::print_json(&records);
            }
            print_status_table(&records);
        }
        Ec2Commands::Start { ids } => {
            cloud.start_instances(&ids).await?;
            ctx.notice(format_args!("{} {}", "✓ 起動を要求しました:".green(), ids.join(", ").cyan()));
        }
        Ec2Commands::Stop { ids } => {
            cloud.stop_instances(&ids).await?;
            ctx.notice(format_args!("{} {}", "✓ 停止を要求しました:".green(), ids.join(", ").cyan()));
        }
        Ec2Commands::Reboot { ids } => {
            cloud.reboot_instances(&ids).await?;
            ctx.notice(format_args!("{} {}", "✓ 再起動を要求しました:".green(), ids.join(", ").cyan()));
        }
        Ec2Commands::Resize { size, ids } => {
            ctx.notice(format_args!(
                "{} {} → {}",
                "インスタンスタイプを変更します:".blue().bold(),
                ids.join(", ").cyan(),
                size.cyan()
            ));
            let (cloud, progress) = utils::with_progress(&cloud, "停止を待機中...");
            let outcomes = match cloud.resize_compute_instances(&ids, &size).await {
                Ok(outcomes) => {
                    progress.finish_success("変更が完了しました");
                    outcomes
                }
                Err(e) => {
                    progress.finish_error(&e.to_string());
                    return Err(e.into());
                }
            };

            if ctx.json {
                return utils::print_json(&outcomes);
            }
            for outcome in &outcomes {
                let note = if outcome.restarted {
                    "再起動済み".green()
                } else {
                    "停止のまま".dimmed()
                };
                println!(
                    "  {} {} → {} ({})",
                    outcome.instance_id.cyan(),
                    outcome.previous_type,
                    outcome.new_type.bold(),
                    note
                );
            }
        }
        Ec2Commands::Wait { state, ids } => {
            let target = InstanceState::from(state);
            let (cloud, progress) =
                utils::with_progress(&cloud, &format!("{} になるのを待機中...", target));
            match cloud.wait_for_compute_state(&ids, target.clone()).await {
                Ok(()) => progress.finish_success(&format!("{} が {} になりました", ids.join(", "), target)),
                Err(e) => {
                    progress.finish_error(&e.to_string());
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

fn print_status_table(records: &[ComputeStatus]) {
    if records.is_empty() {
        println!("{}", "該当するインスタンスはありません".dimmed());
        return;
    }

    println!(
        "{}",
        format!(
            "{:<24} {:<14} {:<12} {:<12} {:<16} {:<12} {:<20}",
            "NAME", "STATE", "APPLICATION", "ENVIRONMENT", "ADDRESS", "SIZE", "ID"
        )
        .bold()
    );
    println!("{}", "─".repeat(116).dimmed());

    for r in records {
        println!(
            "{:<24} {:<14} {:<12} {:<12} {:<16} {:<12} {:<20}",
            r.name,
            utils::colored_instance_state(&r.state),
            r.application,
            r.environment.as_deref().unwrap_or("-"),
            r.address.as_deref().unwrap_or("-"),
            r.size,
            r.id.dimmed()
        );
    }
}
