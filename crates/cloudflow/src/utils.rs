use cloudflow_core::{Cloud, InstanceState, Item};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::sync::Arc;

use crate::progress::WaitProgress;

/// 結果を整形済み JSON で出力
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// EC2 の状態を色付きで表示
pub fn colored_instance_state(state: &InstanceState) -> ColoredString {
    let text = state.as_str();
    match state {
        InstanceState::Running => text.green(),
        InstanceState::Stopped => text.red(),
        InstanceState::Terminated | InstanceState::ShuttingDown => text.dimmed(),
        _ => text.yellow(),
    }
}

/// RDS の状態を色付きで表示
pub fn colored_db_status(status: &str) -> ColoredString {
    match status {
        "available" => status.green(),
        "stopped" | "failed" | "deleting" => status.red(),
        _ => status.yellow(),
    }
}

/// 引数の JSON 文字列をオブジェクトとして解釈
pub fn parse_item(raw: &str, what: &str) -> anyhow::Result<Item> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("{} の JSON が不正です: {}", what, e))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(anyhow::anyhow!(
            "{} は JSON オブジェクトで指定してください（受け取った値: {}）",
            what,
            other
        )),
    }
}

/// スピナーを Observer にした Cloud を作る
pub fn with_progress(cloud: &Cloud, message: &str) -> (Cloud, WaitProgress) {
    let progress = WaitProgress::new(message);
    let cloud = cloud.clone().with_observer(Arc::new(progress.clone()));
    (cloud, progress)
}
