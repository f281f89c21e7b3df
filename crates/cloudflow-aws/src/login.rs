//! Authenticated login probe for RDS endpoints

use async_trait::async_trait;
use cloudflow_core::{ConnectionParams, DbEngine, LoginProbe};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection};

/// Opens one real SQL connection per attempt and closes it again
#[derive(Debug, Clone)]
pub struct SqlLoginProbe {
    params: ConnectionParams,
}

impl SqlLoginProbe {
    pub fn new(params: ConnectionParams) -> Self {
        Self { params }
    }

    fn postgres_options(&self) -> PgConnectOptions {
        let p = &self.params;
        let options = PgConnectOptions::new()
            .host(&p.host)
            .port(p.port)
            .username(&p.username)
            .password(&p.password);
        match &p.database {
            Some(db) => options.database(db),
            None => options,
        }
    }

    fn mysql_options(&self) -> MySqlConnectOptions {
        let p = &self.params;
        let options = MySqlConnectOptions::new()
            .host(&p.host)
            .port(p.port)
            .username(&p.username)
            .password(&p.password);
        match &p.database {
            Some(db) => options.database(db),
            None => options,
        }
    }
}

#[async_trait]
impl LoginProbe for SqlLoginProbe {
    fn describe(&self) -> String {
        let p = &self.params;
        format!("{}@{}:{}", p.username, p.host, p.port)
    }

    async fn try_login(&self) -> anyhow::Result<()> {
        match self.params.engine {
            DbEngine::Postgres => {
                let conn = self.postgres_options().connect().await?;
                conn.close().await?;
            }
            DbEngine::MySql => {
                let conn = self.mysql_options().connect().await?;
                conn.close().await?;
            }
        }
        Ok(())
    }
}
