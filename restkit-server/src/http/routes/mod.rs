//! Route handlers organized by resource

pub mod bitacora;
pub mod docs;
pub mod formas_pago;
pub mod health;
pub mod samples;
