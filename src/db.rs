use anyhow::{Context, Result};
use postgres::types::ToSql;
use postgres::{Client, Config, NoTls};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DatabaseTarget {
    pub dbname: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub schema: String,
}

impl DatabaseTarget {
    pub fn ogr_connection_string(&self) -> String {
        format!(
            "PG:dbname='{}' host='{}' port='{}' user='{}' password='{}'",
            self.dbname, self.host, self.port, self.user, self.password
        )
    }

    fn client_config(&self) -> Config {
        let mut config = Config::new();
        config
            .dbname(&self.dbname)
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

pub trait SqlRunner {
    fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64>;
}

/// Opens a fresh connection for every statement. Statements run outside any
/// transaction, so each one autocommits.
#[derive(Debug)]
pub struct PgSqlRunner {
    target: DatabaseTarget,
}

impl PgSqlRunner {
    pub fn new(target: DatabaseTarget) -> Self {
        Self { target }
    }
}

impl SqlRunner for PgSqlRunner {
    fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        debug!(sql = statement, "executing statement");

        let mut client: Client = self
            .target
            .client_config()
            .connect(NoTls)
            .with_context(|| {
                format!(
                    "failed to connect to database {} on {}:{}",
                    self.target.dbname, self.target.host, self.target.port
                )
            })?;

        client
            .execute(statement, params)
            .with_context(|| format!("failed to execute statement: {statement}"))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::sample_target;

    #[test]
    fn ogr_connection_string_quotes_every_field() {
        assert_eq!(
            sample_target().ogr_connection_string(),
            "PG:dbname='gis' host='localhost' port='5432' user='loader' password='secret'"
        );
    }
}
