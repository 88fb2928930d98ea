//! Read-only services backed by stored database functions
//!
//! Each service borrows a `QueryExecutor` for the length of a request,
//! the same way the handlers construct them.

pub mod bitacora;
pub mod formas_pago;

pub use bitacora::BitacoraService;
pub use formas_pago::FormasPagoService;
