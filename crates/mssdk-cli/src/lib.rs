//! # mssdk-cli — Command-Line Interface for the Mapping Suite SDK
//!
//! Provides the `mssdk` binary.
//!
//! ## Subcommands
//!
//! - `mssdk validate from-archive|from-folder|from-git` — package validation.
//! - `mssdk hash` — compute (and optionally store) a package signature.
//! - `mssdk pack` / `mssdk unpack` — archive a package folder and back.
//!
//! ```bash
//! mssdk validate from-folder ./mappings --update-hash
//! mssdk validate from-git https://github.com/OP-TED/ted-rdf-mapping-eforms "mappings/package_eforms_*" -b 2.1.0
//! mssdk -vv hash ./mappings/package_cn_v1.9 --write
//! ```
//!
//! Every handler returns an exit code; operational errors propagate as
//! `anyhow::Error` and `main` turns them into [`EXIT_ERROR`].

pub mod archive;
pub mod config;
pub mod hash;
pub mod telemetry;
pub mod validate;

/// Every package checked was valid, or the command succeeded.
pub const EXIT_OK: u8 = 0;
/// At least one package failed validation.
pub const EXIT_INVALID: u8 = 1;
/// The command could not run: bad input, I/O, git or archive failure.
pub const EXIT_ERROR: u8 = 2;
