// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use stint_core::LocalStore;
use tracing::info;

use crate::env;
use crate::error::{Error, Result};

pub fn run(store: &LocalStore, user_id: Option<String>) -> Result<()> {
    let user_id = user_id.or_else(env::user).ok_or_else(|| {
        Error::InvalidInput(
            "no user id given\n  hint: pass one or set STINT_USER".to_string(),
        )
    })?;
    let adopted = store.assign_owner(&user_id)?;
    info!(user = %user_id, adopted, "device associated with user");

    println!("Logged in as {}", user_id);
    if adopted > 0 {
        println!("{} record(s) queued for upload", adopted);
    }
    Ok(())
}

#[cfg(test)]
#[path = "login_tests.rs"]
mod tests;
