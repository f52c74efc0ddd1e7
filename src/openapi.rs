use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

/// OpenAPI description of the public endpoints. Served as-is.
pub const OPENAPI_DOCUMENT: &str = r#"
{
    "openapi": "3.0.0",
    "info": {
        "title": "Quote Service API",
        "description": "Quote Service API",
        "version": "0.1.0"
    },
    "servers": [
        {
            "url": "http://api.example.com"
        }
    ],
    "paths": {
        "/": {
            "get": {
                "summary": "Return a randomly selected quote.",
                "responses": {
                    "200": {
                        "description": "A JSON object with a quote and some additional metadata.",
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "server": {"type": "string"},
                                        "quote": {"type": "string"},
                                        "time": {"type": "string"}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "/debug/": {
            "get": {
                "summary": "Return debug information about the request.",
                "responses": {
                    "200": {
                        "description": "A JSON object with debug information about the request and additional metadata.",
                        "content": {
                            "application/json" : {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "server": {"type": "string"},
                                        "time": {"type": "string"},
                                        "host": {"type": "string"},
                                        "proto": {"type": "string"},
                                        "url":  {"type": "string"},
                                        "remoteaddr": {"type": "string"},
                                        "headers": {"type": "object"}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
"#;

pub async fn get_openapi_document() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        OPENAPI_DOCUMENT,
    )
}
