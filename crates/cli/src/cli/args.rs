// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Shared argument structs for CLI commands.

use clap::Args;

/// Session selection for `list`.
#[derive(Args, Clone, Debug, Default)]
pub struct ListFilterArgs {
    /// Only sessions that have not been stopped
    #[arg(long)]
    pub open: bool,

    /// Only sessions waiting to be synced
    #[arg(long, conflicts_with = "conflict")]
    pub pending: bool,

    /// Only sessions in conflict with the remote
    #[arg(long)]
    pub conflict: bool,
}

/// Limit arguments for paginated results.
#[derive(Args, Clone, Debug, Default)]
pub struct LimitArgs {
    /// Maximum number of results
    #[arg(short = 'n', long, conflicts_with = "no_limit")]
    pub limit: Option<usize>,

    #[arg(long, conflicts_with = "limit")]
    pub no_limit: bool,
}
