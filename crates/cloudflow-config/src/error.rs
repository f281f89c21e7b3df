use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "認証情報が不足しています: {}\n\
        strict モードでは IAM ロール等へのフォールバックを行いません",
        missing.join(", ")
    )]
    MissingCredentials { missing: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
