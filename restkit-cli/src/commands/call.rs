//! One-shot stored function call
//!
//! `restkit call public.ft_obtener_bitacora` prints the unwrapped rows.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use restkit_server::{Database, Param};

use crate::config::DatabaseArgs;

/// Arguments for the call command
#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Function name, optionally schema-qualified (e.g. facturacion.ft_obtiene_formas_pago)
    pub function: String,

    /// Positional arguments; JSON literals are bound as typed values, anything else as text
    #[arg(allow_negative_numbers = true)]
    pub params: Vec<String>,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Parse one command line argument into a bind parameter.
fn parse_param(raw: &str) -> Param {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Param::from(value),
        Err(_) => Param::Text(raw.to_string()),
    }
}

/// Call a stored function once and print the result
pub async fn run_call(args: CallArgs) -> Result<()> {
    let params: Vec<Param> = args.params.iter().map(|raw| parse_param(raw)).collect();

    let db = Database::initialize(&args.db.to_config()).await;
    let result = db.call_function(&args.function, &params).await;
    db.shutdown().await;

    let rows = result.with_context(|| format!("Calling {} failed", args.function))?;
    let output = serde_json::to_string_pretty(&rows).context("Failed to serialize result")?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_literals_are_typed() {
        assert_eq!(parse_param("42"), Param::Int(42));
        assert_eq!(parse_param("true"), Param::Bool(true));
        assert_eq!(parse_param("null"), Param::Null);
        assert_eq!(parse_param("\"quoted\""), Param::Text("quoted".into()));
        assert_eq!(parse_param(r#"{"a":1}"#), Param::Json(json!({ "a": 1 })));
    }

    #[test]
    fn other_input_is_text() {
        assert_eq!(parse_param("efectivo"), Param::Text("efectivo".into()));
        assert_eq!(parse_param("2024-01-01"), Param::Text("2024-01-01".into()));
    }

    #[test]
    fn negative_numbers_are_arguments() {
        let args = CallArgs::try_parse_from([
            "call",
            "schema.fn",
            "-5",
            "-1.5",
            "--db-host",
            "localhost",
            "--db-user",
            "postgres",
            "--db-password",
            "secret",
            "--db-name",
            "app",
        ])
        .expect("negative numbers should parse as arguments");

        assert_eq!(args.params, vec!["-5", "-1.5"]);
        assert_eq!(parse_param(&args.params[0]), Param::Int(-5));
        assert_eq!(parse_param(&args.params[1]), Param::Float(-1.5));
        assert_eq!(args.db.db_host, "localhost");
    }
}
