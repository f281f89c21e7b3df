#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;

const CREDENTIAL_VARS: [&str; 6] = [
    "awsAccessKeyId",
    "awsSecretAccessKey",
    "awsRegion",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_REGION",
];

fn cflow() -> Command {
    let mut cmd = Command::cargo_bin("cflow").unwrap();
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("CLOUDFLOW_STRICT_CREDENTIALS");
    cmd
}

/// AWS に到達できない環境（リージョン・認証情報・IMDS なし）で実行する
fn cflow_offline() -> Command {
    let mut cmd = cflow();
    for var in [
        "AWS_DEFAULT_REGION",
        "AWS_PROFILE",
        "AWS_SESSION_TOKEN",
        "AWS_WEB_IDENTITY_TOKEN_FILE",
        "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
        "AWS_CONTAINER_CREDENTIALS_FULL_URI",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("AWS_CONFIG_FILE", "/nonexistent/cloudflow/config")
        .env("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/cloudflow/credentials")
        .env("AWS_EC2_METADATA_DISABLED", "true");
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    cflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ec2"))
        .stdout(predicate::str::contains("rds"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("ddb"))
        .stdout(predicate::str::contains("net"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    cflow()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudflow"));
}

/// ec2 resize のヘルプに --size が含まれることを確認
#[test]
fn test_ec2_resize_help() {
    cflow()
        .args(["ec2", "resize", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--size"));
}

/// ID なしの ec2 start はエラー
#[test]
fn test_ec2_start_requires_ids() {
    cflow().args(["ec2", "start"]).assert().failure();
}

/// strict モードでは認証情報が無いと終了コード 1
#[test]
fn test_strict_mode_without_credentials_fails() {
    cflow()
        .args(["--strict", "ec2", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AWS_ACCESS_KEY_ID"));
}

/// 環境変数でも strict モードを有効にできる
#[test]
fn test_strict_mode_from_env() {
    cflow()
        .env("CLOUDFLOW_STRICT_CREDENTIALS", "true")
        .env("AWS_ACCESS_KEY_ID", "AKIATEST")
        .args(["rds", "status"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AWS_SECRET_ACCESS_KEY"))
        .stderr(predicate::str::contains("AWS_ACCESS_KEY_ID").not());
}

/// S3 バケットと GitHub リポジトリは同時に指定できない
#[test]
fn test_deploy_run_conflicting_revisions() {
    cflow()
        .args([
            "deploy", "run", "--app", "shop", "--group", "web", "--bucket", "b", "--key", "k",
            "--repository", "acme/shop", "--commit", "abc",
        ])
        .assert()
        .failure();
}

/// リビジョン未指定は接続前にエラー
#[test]
fn test_deploy_run_without_revision() {
    cflow()
        .args(["--strict", "deploy", "run", "--app", "shop", "--group", "web"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("リビジョンを指定してください"));
}

/// 不正なタグフィルタは引数エラー
#[test]
fn test_group_set_filter_rejects_empty_tag() {
    cflow()
        .args(["deploy", "group", "set-filter", "--app", "shop", "--group", "web", "--tag", "="])
        .assert()
        .failure();
}

/// JSON オブジェクト以外の --item は接続前にエラー
#[test]
fn test_ddb_put_rejects_non_object() {
    cflow()
        .args(["--strict", "ddb", "put", "--table", "t", "--item", "[1,2]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--item"));
}

/// 誰も待ち受けていないポートは試行回数を使い切って失敗
#[test]
fn test_net_wait_exhausts_budget() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    cflow()
        .args(["net", "wait", "127.0.0.1", &port.to_string(), "--minutes", "1", "--interval", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("2 attempts"));
}

/// --json では ec2 resize の見出しを stdout に出さない
#[test]
fn test_json_ec2_resize_keeps_stdout_clean() {
    cflow_offline()
        .args(["--json", "ec2", "resize", "--size", "m5.large", "i-1"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

/// --json では deploy run の見出しを stdout に出さない
#[test]
fn test_json_deploy_run_keeps_stdout_clean() {
    cflow_offline()
        .args([
            "--json", "deploy", "run", "--app", "shop", "--group", "web", "--bucket", "releases",
            "--key", "shop.zip",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

/// --json なしでは見出しが stdout に出る
#[test]
fn test_ec2_resize_prints_header_without_json() {
    cflow_offline()
        .args(["ec2", "resize", "--size", "m5.large", "i-1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("インスタンスタイプを変更します"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    cflow().arg("invalid-command").assert().failure();
}
