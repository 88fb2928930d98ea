//! Activity log (bitácora)

use serde_json::Value;

use crate::db::{call_function, DbError, QueryExecutor};

/// `RETURNS json`, aggregated with `JSON_AGG(ROW_TO_JSON(...))`
pub const BITACORA_FUNCTION: &str = "public.ft_obtener_bitacora";

pub struct BitacoraService<'a> {
    executor: &'a dyn QueryExecutor,
}

impl<'a> BitacoraService<'a> {
    pub fn new(executor: &'a dyn QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn get_bitacora(&self) -> Result<Vec<Value>, DbError> {
        call_function(self.executor, BITACORA_FUNCTION, &[]).await
    }
}
