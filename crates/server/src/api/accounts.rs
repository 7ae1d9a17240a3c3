//! Account directory handlers.

use axum::{extract::State, Json};
use postflow_core::Account;
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

/// Accounts never carry passwords over the wire.
#[derive(Debug, Serialize)]
pub struct AccountsResponse {
    pub success: bool,
    pub accounts: Vec<Account>,
}

pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AccountsResponse>, ApiError> {
    let accounts = state.accounts().list()?;
    Ok(Json(AccountsResponse {
        success: true,
        accounts,
    }))
}
