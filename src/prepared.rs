//! Prepared and callable statement proxies
//!
//! Every setter is forwarded first and recorded only once the driver has
//! accepted it, so the tracker mirrors what the driver holds. Executions log
//! the prepared SQL rendered with the tracked bindings before delegating.

use async_trait::async_trait;

use crate::{
    api::{CallableStatement, Connection, ParameterInfo, PreparedStatement},
    config::BatchPolicy,
    sink::Operation,
    statement::LogStatement,
    types::SqlType,
    value::{ParamStream, ParamValue},
};

impl<C: Connection, S> LogStatement<C, S> {
    fn prepared_sql(&self) -> &str {
        self.sql.as_deref().unwrap_or_default()
    }
}

#[async_trait]
impl<C, S> PreparedStatement for LogStatement<C, S>
where
    C: Connection,
    S: PreparedStatement,
{
    async fn execute(&mut self) -> Result<bool, Self::Error> {
        self.log_execution(Operation::Execute, self.prepared_sql());
        self.inner.execute().await
    }

    async fn execute_query(&mut self) -> Result<Self::ResultSet, Self::Error> {
        self.log_execution(Operation::ExecuteQuery, self.prepared_sql());
        self.inner.execute_query().await
    }

    async fn execute_update(&mut self) -> Result<u64, Self::Error> {
        self.log_execution(Operation::ExecuteUpdate, self.prepared_sql());
        self.inner.execute_update().await
    }

    async fn add_batch(&mut self) -> Result<(), Self::Error> {
        self.log_batch_entry(self.prepared_sql());
        self.inner.add_batch().await?;
        self.batch_len += 1;
        if self.connection.config().batch_policy == BatchPolicy::Clear {
            self.params.clear();
        }
        Ok(())
    }

    fn set_value(&mut self, index: u32, value: ParamValue) -> Result<(), Self::Error> {
        self.inner.set_value(index, value.clone())?;
        self.params.bind(index, value);
        Ok(())
    }

    fn set_null(&mut self, index: u32, sql_type: SqlType) -> Result<(), Self::Error> {
        self.inner.set_null(index, sql_type)?;
        self.params.bind_null(index);
        Ok(())
    }

    fn set_stream(&mut self, index: u32, stream: ParamStream) -> Result<(), Self::Error> {
        let reference = stream.reference();
        self.inner.set_stream(index, stream)?;
        self.params.bind(index, ParamValue::Stream(reference));
        Ok(())
    }

    fn clear_parameters(&mut self) -> Result<(), Self::Error> {
        self.inner.clear_parameters()?;
        self.params.clear();
        Ok(())
    }

    fn parameter_metadata(&self) -> Result<Vec<ParameterInfo>, Self::Error> {
        self.inner.parameter_metadata()
    }
}

impl<C, S> CallableStatement for LogStatement<C, S>
where
    C: Connection,
    S: CallableStatement,
{
    fn register_out_parameter(&mut self, index: u32, sql_type: SqlType) -> Result<(), Self::Error> {
        self.connection.emit(
            Operation::RegisterOutParameter,
            format!("registering OUT parameter {} as {}", index, sql_type),
        );
        self.inner.register_out_parameter(index, sql_type)
    }

    fn out_value(&self, index: u32) -> Result<ParamValue, Self::Error> {
        self.inner.out_value(index)
    }

    fn was_null(&self) -> Result<bool, Self::Error> {
        self.inner.was_null()
    }
}
