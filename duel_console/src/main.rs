// Legend for various fix-this comments:
//   * "TODO" - bug or missing crucial feature.
//   * "Improvement potential" - missing nice-to-have feature or an opportunity
//       to make code better or faster.
//   * "Rust-upgrade" - place where code can be improved using a Rust feature
//       that is not implemented or stabilized yet.

#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod network;
pub mod tui;

mod client_main;

use std::fs::File;

use anyhow::Context;
use clap::{Command, arg};


fn main() -> anyhow::Result<()> {
    let matches = Command::new("Duel chess")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .about("Timed two-player chess console client")
        .arg(
            arg!(--"server-address" <address> "Server host and port")
                .default_value("localhost:8000"),
        )
        .arg(
            arg!(--"log-file" <path> "Log destination (the terminal is taken by the board)")
                .default_value("duel_console.log"),
        )
        .get_matches();

    let log_file = matches.get_one::<String>("log-file").unwrap();
    let log_target =
        File::create(log_file).with_context(|| format!("Cannot create log file {log_file}"))?;
    env_logger::Builder::new()
        .target(env_logger::Target::Pipe(Box::new(log_target)))
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    client_main::run(client_main::ClientConfig {
        server_address: matches.get_one::<String>("server-address").unwrap().clone(),
    })
}
