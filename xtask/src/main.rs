// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask
//!
//! Developer tasks for the Antares variant workspace, run as `cargo xtask <task>`.
//!
//! Tasks that run per package (`docs`, `test`) read the workspace members from
//! `cargo metadata` and skip `xtask` itself.

#![deny(
    clippy::pedantic,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use cargo_metadata::{Metadata, MetadataCommand, Package};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    Result,
    eyre::{Context, bail},
};
use duct::{Expression, cmd};
use tracing_log::AsTrace;

/// Packages holding the command engine; `test` runs these first.
const LIBRARY_PACKAGES: [&str; 2] = ["antares-study", "antares-variant"];

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.verbosity.log_level_filter().as_trace())
        .without_time()
        .init();

    if let Err(err) = args.task.run() {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    task: Task,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

#[derive(Clone, Debug, Subcommand)]
enum Task {
    /// Formatting, clippy, docs, then the tests of every package
    Ci,

    /// Type-check every target
    #[command(visible_alias = "c")]
    Check,

    /// Run clippy with warnings denied
    #[command(visible_alias = "cl")]
    Clippy {
        /// Apply the suggested fixes
        #[arg(long)]
        fix: bool,
    },

    /// Check formatting with nightly rustfmt
    Fmt {
        /// Rewrite the files instead of checking them
        #[arg(long)]
        fix: bool,
    },

    /// Build the docs of each package with warnings denied
    #[command(visible_alias = "d")]
    Docs,

    /// Run the tests of one package, or of every package
    #[command(visible_alias = "t")]
    Test {
        /// Only test this package
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Write an lcov report for the library packages to target/lcov.info
    #[command(visible_alias = "cov")]
    Coverage,

    /// Check licenses, advisories and unused dependencies
    Deps,
}

impl Task {
    fn run(self) -> Result<()> {
        match self {
            Self::Ci => {
                fmt(false)?;
                clippy(false)?;
                docs()?;
                test(None)
            }
            Self::Check => cargo(&["check", "--workspace", "--all-targets"]),
            Self::Clippy { fix } => clippy(fix),
            Self::Fmt { fix } => fmt(fix),
            Self::Docs => docs(),
            Self::Test { package } => test(package.as_deref()),
            Self::Coverage => coverage(),
            Self::Deps => {
                cargo(&["deny", "check"])?;
                traced(&cmd!("cargo-machete"))
            }
        }
    }
}

fn clippy(fix: bool) -> Result<()> {
    let mut args: Vec<&str> = vec!["clippy", "--workspace", "--all-targets"];
    if fix {
        args.extend(["--fix", "--allow-dirty", "--allow-staged"]);
    }
    args.extend(["--", "-D", "warnings"]);
    cargo(&args)
}

fn fmt(fix: bool) -> Result<()> {
    let args: &[&str] = if fix {
        &["fmt", "--all"]
    } else {
        &["fmt", "--all", "--check"]
    };
    traced(&nightly(cmd("cargo", args.iter().copied())))
}

fn docs() -> Result<()> {
    for package in members()? {
        traced(
            &nightly(cmd!("cargo", "doc", "--no-deps", "--package", &package))
                .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings"),
        )?;
    }
    Ok(())
}

/// Tests the library packages first, then the rest of the workspace.
fn test(package: Option<&str>) -> Result<()> {
    let members: Vec<String> = members()?;
    let selected: Vec<String> = match package {
        Some(name) if members.iter().any(|m| m == name) => vec![name.to_string()],
        Some(name) => bail!("'{name}' is not a workspace package, expected one of {members:?}"),
        None => {
            let (mut ordered, rest): (Vec<String>, Vec<String>) = members
                .into_iter()
                .partition(|m| LIBRARY_PACKAGES.contains(&m.as_str()));
            ordered.extend(rest);
            ordered
        }
    };
    for name in selected.iter().map(String::as_str) {
        cargo(&["test", "--package", name, "--all-targets"])?;
        cargo(&["test", "--package", name, "--doc"])
            .or_else(|err| skip_without_lib(name, err))?;
    }
    Ok(())
}

/// `cargo test --doc` fails on binary-only packages.
fn skip_without_lib(name: &str, err: color_eyre::Report) -> Result<()> {
    if LIBRARY_PACKAGES.contains(&name) {
        return Err(err);
    }
    tracing::debug!("no doc tests for {name}: {err}");
    Ok(())
}

fn coverage() -> Result<()> {
    let mut args: Vec<&str> = vec!["llvm-cov", "--lcov", "--output-path", "target/lcov.info"];
    for package in LIBRARY_PACKAGES {
        args.extend(["--package", package]);
    }
    cargo(&args)
}

/// Names of the workspace members, without `xtask`.
fn members() -> Result<Vec<String>> {
    let metadata: Metadata = MetadataCommand::new()
        .no_deps()
        .exec()
        .wrap_err("failed to read cargo metadata")?;
    Ok(metadata
        .workspace_packages()
        .into_iter()
        .map(|package: &Package| package.name.to_string())
        .filter(|name| name != "xtask")
        .collect())
}

fn cargo(args: &[&str]) -> Result<()> {
    traced(&cmd("cargo", args.iter().copied()))
}

/// Runs under the nightly toolchain; `CARGO` points at the stable cargo running xtask.
fn nightly(expression: Expression) -> Expression {
    expression
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
}

fn traced(expression: &Expression) -> Result<()> {
    tracing::info!("running {expression:?}");
    expression
        .run()
        .wrap_err_with(|| format!("{expression:?} failed"))?;
    Ok(())
}
