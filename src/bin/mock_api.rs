//! Mock transaction API for local development and demos.
//!
//! Serves a small in-memory dataset of users and their financial
//! transactions, with an OpenAPI document at /openapi.json so it can be
//! registered as an `openapi` data source.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "mock-api", version, about = "Mock users/transactions REST API")]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind to
    #[arg(long, default_value_t = 8001)]
    port: u16,
}

#[derive(Debug, Clone, Serialize)]
struct Transaction {
    id: u64,
    user_id: u64,
    amount: f64,
    description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct User {
    id: u64,
    name: &'static str,
    email: &'static str,
    transactions: Vec<Transaction>,
}

fn users() -> Vec<User> {
    vec![
        User {
            id: 1,
            name: "Ariel Henryson",
            email: "ariel@example.com",
            transactions: Vec::new(),
        },
        User {
            id: 2,
            name: "Jane Doe",
            email: "jane@example.com",
            transactions: Vec::new(),
        },
    ]
}

fn transactions() -> Vec<Transaction> {
    vec![
        Transaction {
            id: 1,
            user_id: 1,
            amount: 100.50,
            description: "Groceries",
        },
        Transaction {
            id: 2,
            user_id: 1,
            amount: 25.00,
            description: "Coffee",
        },
        Transaction {
            id: 3,
            user_id: 2,
            amount: 500.00,
            description: "Rent",
        },
        Transaction {
            id: 4,
            user_id: 1,
            amount: 75.20,
            description: "Dinner",
        },
    ]
}

fn transactions_for(user_id: u64) -> Vec<Transaction> {
    transactions()
        .into_iter()
        .filter(|t| t.user_id == user_id)
        .collect()
}

fn not_found(detail: String) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": detail })))
}

/// GET /users - all users, transactions left empty.
async fn get_users() -> Json<Vec<User>> {
    Json(users())
}

/// GET /users/{user_id} - single user with transactions populated.
async fn get_user(Path(user_id): Path<u64>) -> Result<Json<User>, (StatusCode, Json<Value>)> {
    let mut user = users()
        .into_iter()
        .find(|u| u.id == user_id)
        .ok_or_else(|| not_found("User not found".to_string()))?;
    user.transactions = transactions_for(user_id);
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
struct TransactionFilter {
    user_id: Option<u64>,
}

/// GET /transactions - all transactions, optionally filtered by user_id.
async fn get_transactions(
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Vec<Transaction>>, (StatusCode, Json<Value>)> {
    match filter.user_id {
        Some(user_id) => {
            if !users().iter().any(|u| u.id == user_id) {
                return Err(not_found(format!("User with id {} not found.", user_id)));
            }
            Ok(Json(transactions_for(user_id)))
        }
        None => Ok(Json(transactions())),
    }
}

/// GET /users/{user_id}/transactions - transactions for one user.
async fn get_user_transactions(
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<Transaction>>, (StatusCode, Json<Value>)> {
    if !users().iter().any(|u| u.id == user_id) {
        return Err(not_found("User not found".to_string()));
    }
    Ok(Json(transactions_for(user_id)))
}

/// GET /openapi.json - OpenAPI 3 document describing this API.
async fn openapi_spec() -> Json<Value> {
    let transaction_schema = json!({
        "type": "object",
        "required": ["id", "user_id", "amount", "description"],
        "properties": {
            "id": { "type": "integer" },
            "user_id": { "type": "integer" },
            "amount": { "type": "number" },
            "description": { "type": "string" }
        }
    });
    let user_schema = json!({
        "type": "object",
        "required": ["id", "name", "email"],
        "properties": {
            "id": { "type": "integer" },
            "name": { "type": "string" },
            "email": { "type": "string" },
            "transactions": {
                "type": "array",
                "items": { "$ref": "#/components/schemas/Transaction" }
            }
        }
    });

    Json(json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Mock Transaction API",
            "description": "A mock API for managing users and their financial transactions.",
            "version": "1.0.0"
        },
        "paths": {
            "/users": {
                "get": {
                    "summary": "Retrieve a list of all users",
                    "description": "The transactions for each user are not populated here.",
                    "responses": {
                        "200": {
                            "description": "List of users",
                            "content": { "application/json": { "schema": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/User" }
                            } } }
                        }
                    }
                }
            },
            "/users/{user_id}": {
                "get": {
                    "summary": "Retrieve a single user by ID",
                    "description": "Populates the user's transactions list.",
                    "parameters": [{
                        "name": "user_id",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "integer" }
                    }],
                    "responses": {
                        "200": {
                            "description": "The user",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/User" } } }
                        },
                        "404": { "description": "User not found" }
                    }
                }
            },
            "/transactions": {
                "get": {
                    "summary": "Retrieve a list of all transactions",
                    "description": "Optionally filter by user_id.",
                    "parameters": [{
                        "name": "user_id",
                        "in": "query",
                        "required": false,
                        "schema": { "type": "integer" }
                    }],
                    "responses": {
                        "200": {
                            "description": "List of transactions",
                            "content": { "application/json": { "schema": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Transaction" }
                            } } }
                        },
                        "404": { "description": "User not found" }
                    }
                }
            },
            "/users/{user_id}/transactions": {
                "get": {
                    "summary": "Retrieve all transactions for a specific user",
                    "parameters": [{
                        "name": "user_id",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "integer" }
                    }],
                    "responses": {
                        "200": {
                            "description": "List of transactions",
                            "content": { "application/json": { "schema": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Transaction" }
                            } } }
                        },
                        "404": { "description": "User not found" }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Transaction": transaction_schema,
                "User": user_schema
            }
        }
    }))
}

fn router() -> axum::Router {
    axum::Router::new()
        .route("/users", get(get_users))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/transactions", get(get_user_transactions))
        .route("/transactions", get(get_transactions))
        .route("/openapi.json", get(openapi_spec))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Mock transaction API listening on {}", bind_addr);

    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transactions_for_user() {
        let txs = transactions_for(1);
        assert_eq!(txs.len(), 3);
        assert!(txs.iter().all(|t| t.user_id == 1));

        let txs = transactions_for(2);
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].description, "Rent");
    }

    #[test]
    fn test_unknown_user_has_no_transactions() {
        assert!(transactions_for(99).is_empty());
    }

    #[tokio::test]
    async fn test_get_user_populates_transactions() {
        let Json(user) = get_user(Path(1)).await.unwrap();
        assert_eq!(user.name, "Ariel Henryson");
        assert_eq!(user.transactions.len(), 3);
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let err = get_user(Path(42)).await.err().unwrap();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transactions_filter_unknown_user() {
        let err = get_transactions(Query(TransactionFilter { user_id: Some(42) }))
            .await
            .err()
            .unwrap();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_spec_lists_paths() {
        let Json(spec) = openapi_spec().await;
        let paths = spec["paths"].as_object().unwrap();
        assert!(paths.contains_key("/users"));
        assert!(paths.contains_key("/transactions"));
        assert!(paths.contains_key("/users/{user_id}/transactions"));
    }
}
