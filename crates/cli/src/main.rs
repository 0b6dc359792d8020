// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use stint::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = stint::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
