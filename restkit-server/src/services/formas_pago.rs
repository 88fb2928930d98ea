//! Payment methods (formas de pago)

use serde_json::Value;

use crate::db::{call_function, DbError, QueryExecutor};

pub const FORMAS_PAGO_FUNCTION: &str = "facturacion.ft_obtiene_formas_pago";

pub struct FormasPagoService<'a> {
    executor: &'a dyn QueryExecutor,
}

impl<'a> FormasPagoService<'a> {
    pub fn new(executor: &'a dyn QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn get_formas_pago(&self) -> Result<Vec<Value>, DbError> {
        call_function(self.executor, FORMAS_PAGO_FUNCTION, &[]).await
    }
}
