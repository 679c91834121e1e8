//! PostgreSQL store backed by a tokio-postgres client

use bytes::BytesMut;
use std::error::Error as StdError;
use tokio::task::JoinHandle;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::{Client, NoTls, Statement};
use tracing::{debug, error};

use super::Store;
use crate::config::StoreKind;
use crate::error::ShelfloadResult;
use crate::types::FieldValue;

pub struct PgStore {
    client: Client,
    connection_task: JoinHandle<()>,
}

impl PgStore {
    /// Connect using a libpq-style connection string or URL
    pub async fn connect(conn_str: &str) -> ShelfloadResult<Self> {
        let (client, connection) = tokio_postgres::connect(conn_str, NoTls).await?;

        let connection_task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        debug!("PostgreSQL connection established");
        Ok(Self { client, connection_task })
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self {
            FieldValue::Null => Ok(IsNull::Yes),
            FieldValue::Integer(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::INT8 => v.to_sql(ty, out),
                _ => v.to_string().to_sql(ty, out),
            },
            FieldValue::Text(s) => {
                if <String as ToSql>::accepts(ty) {
                    s.to_sql(ty, out)
                } else {
                    Err(format!("cannot bind text {:?} to a {} parameter", s, ty).into())
                }
            }
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(*ty, Type::INT2 | Type::INT4 | Type::INT8) || <String as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}

impl Store for PgStore {
    type Statement = Statement;

    fn kind(&self) -> StoreKind {
        StoreKind::Postgres
    }

    async fn prepare(&mut self, sql: &str) -> ShelfloadResult<Statement> {
        Ok(self.client.prepare(sql).await?)
    }

    async fn execute(&mut self, statement: &Statement, params: &[FieldValue]) -> ShelfloadResult<u64> {
        let params: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Ok(self.client.execute(statement, &params).await?)
    }

    async fn execute_batch(&mut self, sql: &str) -> ShelfloadResult<()> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    async fn close(self) -> ShelfloadResult<()> {
        // Dropping the client ends the connection future
        drop(self.client);
        if let Err(e) = self.connection_task.await {
            error!(error = %e, "PostgreSQL connection task did not shut down cleanly");
        }
        Ok(())
    }
}
