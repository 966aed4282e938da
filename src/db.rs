// zabbixtool/src/db.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;

use crate::config::ConnectionSettings;

/// One-statement execution capability. The restore engine never sees more of
/// the backend than this.
#[async_trait]
pub trait SqlExecutor: Send {
    async fn execute(&mut self, statement: &str) -> Result<()>;
}

/// Opens one dedicated connection per caller. Each restore worker owns its
/// connection for the lifetime of the pool; nothing is shared or reused.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    type Conn: SqlExecutor + Send + 'static;

    async fn connect(&self) -> Result<Self::Conn>;
}

#[async_trait]
impl SqlExecutor for MySqlConnection {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        sqlx::query(statement).execute(&mut *self).await?;
        Ok(())
    }
}

pub struct MySqlFactory {
    settings: ConnectionSettings,
}

impl MySqlFactory {
    pub fn new(settings: ConnectionSettings) -> Self {
        MySqlFactory { settings }
    }
}

#[async_trait]
impl ConnectionFactory for MySqlFactory {
    type Conn = MySqlConnection;

    async fn connect(&self) -> Result<MySqlConnection> {
        let options = MySqlConnectOptions::new()
            .host(&self.settings.host)
            .port(self.settings.port)
            .username(&self.settings.user)
            .password(&self.settings.password)
            .database(&self.settings.database);

        MySqlConnection::connect_with(&options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to mysql://{}@{}:{}/{}",
                    self.settings.user,
                    self.settings.host,
                    self.settings.port,
                    self.settings.database
                )
            })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Shared record of every execute attempt, with optional failure
    /// injection for statements containing a marker substring.
    #[derive(Clone, Default)]
    pub struct ExecLog {
        statements: Arc<Mutex<Vec<String>>>,
        fail_markers: Arc<Mutex<Vec<String>>>,
    }

    impl ExecLog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_on(&self, marker: &str) {
            self.fail_markers.lock().unwrap().push(marker.to_string());
        }

        pub fn executed(&self) -> Vec<String> {
            self.statements.lock().unwrap().clone()
        }

        fn record(&self, statement: &str) -> Result<()> {
            self.statements.lock().unwrap().push(statement.to_string());
            let failing = self
                .fail_markers
                .lock()
                .unwrap()
                .iter()
                .any(|marker| statement.contains(marker));
            if failing {
                anyhow::bail!("injected failure for statement: {statement}");
            }
            Ok(())
        }
    }

    pub struct MockExecutor {
        log: ExecLog,
    }

    #[async_trait]
    impl SqlExecutor for MockExecutor {
        async fn execute(&mut self, statement: &str) -> Result<()> {
            self.log.record(statement)
        }
    }

    pub struct MockFactory {
        log: ExecLog,
    }

    impl MockFactory {
        pub fn new(log: ExecLog) -> Self {
            MockFactory { log }
        }
    }

    #[async_trait]
    impl ConnectionFactory for MockFactory {
        type Conn = MockExecutor;

        async fn connect(&self) -> Result<MockExecutor> {
            Ok(MockExecutor {
                log: self.log.clone(),
            })
        }
    }
}
