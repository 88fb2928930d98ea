//! API description endpoint
//!
//! Serves a hand-maintained OpenAPI 3 document at GET /api.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::http::server::AppState;
use crate::models::sample::{DESCRIPTION_MAX_LEN, NAME_MAX_LEN, NAME_MIN_LEN};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Error" } } }
    })
}

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    })
}

fn json_body(schema: &str) -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": { "$ref": format!("#/components/schemas/{schema}") } } }
    })
}

fn json_ok(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn sample_paths() -> Value {
    let sample_ref = json!({ "$ref": "#/components/schemas/Sample" });

    let collection = json!({
        "post": {
            "tags": ["sample"],
            "summary": "Create a sample",
            "requestBody": json_body("CreateSample"),
            "responses": {
                "201": json_ok("Created sample", sample_ref.clone()),
                "400": error_response("Invalid body")
            }
        },
        "get": {
            "tags": ["sample"],
            "summary": "List samples",
            "responses": {
                "200": json_ok("All samples", json!({ "type": "array", "items": sample_ref.clone() }))
            }
        }
    });

    let item = json!({
        "get": {
            "tags": ["sample"],
            "summary": "Get a sample",
            "parameters": [id_parameter()],
            "responses": {
                "200": json_ok("The sample", sample_ref.clone()),
                "404": error_response("Unknown id")
            }
        },
        "patch": {
            "tags": ["sample"],
            "summary": "Update the provided fields of a sample",
            "parameters": [id_parameter()],
            "requestBody": json_body("UpdateSample"),
            "responses": {
                "200": json_ok("Updated sample", sample_ref),
                "400": error_response("Invalid body"),
                "404": error_response("Unknown id")
            }
        },
        "delete": {
            "tags": ["sample"],
            "summary": "Delete a sample",
            "parameters": [id_parameter()],
            "responses": {
                "204": { "description": "Deleted" },
                "404": error_response("Unknown id")
            }
        }
    });

    json!({ "/sample": collection, "/sample/{id}": item })
}

fn function_path(tag: &str, summary: &str) -> Value {
    json!({
        "get": {
            "tags": [tag],
            "summary": summary,
            "responses": {
                "200": json_ok(summary, json!({ "type": "array", "items": {} })),
                "500": error_response("Query failed"),
                "503": error_response("Database unavailable")
            }
        }
    })
}

fn schemas() -> Value {
    let sample = json!({
        "type": "object",
        "required": ["id", "name", "description", "isActive", "createdAt", "updatedAt"],
        "properties": {
            "id": { "type": "string", "format": "uuid" },
            "name": { "type": "string" },
            "description": { "type": "string" },
            "isActive": { "type": "boolean" },
            "createdAt": { "type": "string", "format": "date-time" },
            "updatedAt": { "type": "string", "format": "date-time" }
        }
    });
    let name = json!({ "type": "string", "minLength": NAME_MIN_LEN, "maxLength": NAME_MAX_LEN });
    let description = json!({ "type": "string", "maxLength": DESCRIPTION_MAX_LEN });

    json!({
        "Sample": sample,
        "CreateSample": {
            "type": "object",
            "required": ["name"],
            "additionalProperties": false,
            "properties": {
                "name": name.clone(),
                "description": description.clone(),
                "isActive": { "type": "boolean", "default": true }
            }
        },
        "UpdateSample": {
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "name": name,
                "description": description,
                "isActive": { "type": "boolean" }
            }
        },
        "Error": {
            "type": "object",
            "required": ["error", "message"],
            "properties": {
                "error": { "type": "string" },
                "message": { "type": "string" }
            }
        }
    })
}

/// Build the OpenAPI document describing every route.
pub fn openapi_document() -> Value {
    let mut paths = sample_paths();
    if let Value::Object(map) = &mut paths {
        map.insert(
            "/health".into(),
            json!({
                "get": {
                    "tags": ["health"],
                    "summary": "Service health and pool status",
                    "responses": { "200": { "description": "Service is up" } }
                }
            }),
        );
        map.insert("/bitacora".into(), function_path("bitacora", "Activity log entries"));
        map.insert("/formas-pago".into(), function_path("formas-pago", "Payment methods"));
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "restkit API",
            "description": "REST API with a pooled PostgreSQL access layer",
            "version": env!("CARGO_PKG_VERSION")
        },
        "tags": [
            { "name": "sample", "description": "In-memory sample resource" },
            { "name": "bitacora", "description": "Activity log" },
            { "name": "formas-pago", "description": "Payment methods catalogue" },
            { "name": "health", "description": "Liveness" }
        ],
        "paths": paths,
        "components": { "schemas": schemas() }
    })
}

/// GET /api
async fn api_description() -> Json<Value> {
    Json(openapi_document())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api", get(api_description))
}
