use crate::context::Context;
use crate::utils;
use clap::Subcommand;
use colored::Colorize;

#[derive(Subcommand)]
pub enum DdbCommands {
    /// テーブル一覧を表示
    Tables,
    /// アイテムを書き込む
    Put {
        #[arg(long)]
        table: String,
        /// JSON オブジェクト
        #[arg(long)]
        item: String,
    },
    /// アイテムを取得
    Get {
        #[arg(long)]
        table: String,
        /// キーの JSON オブジェクト
        #[arg(long)]
        key: String,
    },
    /// アイテムを削除
    Delete {
        #[arg(long)]
        table: String,
        /// キーの JSON オブジェクト
        #[arg(long)]
        key: String,
    },
}

pub async fn handle(ctx: &Context, cmd: DdbCommands) -> anyhow::Result<()> {
    match cmd {
        DdbCommands::Tables => {
            let tables = ctx.cloud().await?.key_value().list_tables().await?;
            if ctx.json {
                return utils::print_json(&tables);
            }
            if tables.is_empty() {
                println!("{}", "テーブルはありません".dimmed());
            }
            for table in tables {
                println!("{}", table);
            }
        }
        DdbCommands::Put { table, item } => {
            let item = utils::parse_item(&item, "--item")?;
            ctx.cloud().await?.key_value().put_item(&table, &item).await?;
            ctx.notice(format_args!("{} {}", "✓ 書き込みました:".green(), table.cyan()));
        }
        DdbCommands::Get { table, key } => {
            let key = utils::parse_item(&key, "--key")?;
            match ctx.cloud().await?.key_value().get_item(&table, &key).await? {
                Some(item) => utils::print_json(&item)?,
                None if ctx.json => println!("null"),
                None => println!("{}", "アイテムが見つかりません".yellow()),
            }
        }
        DdbCommands::Delete { table, key } => {
            let key = utils::parse_item(&key, "--key")?;
            ctx.cloud().await?.key_value().delete_item(&table, &key).await?;
            ctx.notice(format_args!("{} {}", "✓ 削除しました:".green(), table.cyan()));
        }
    }

    Ok(())
}
