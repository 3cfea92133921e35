// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod archive;
mod run;

use antares_variant::{CommandResultDetail, FailurePolicy};
use archive::{CommandBundle, StudyArchive, read_json, write_json};
use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail};
use run::{GeneratedVariant, Replay};
use std::path::{Path, PathBuf};
use tracing::info;

/// Antares variant tool - extract, replay and diff variant command lists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Write the command list rebuilding a study
    Extract {
        /// Study archive to extract
        #[arg(short, long)]
        archive: PathBuf,

        /// Where to write the command bundle. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a command bundle to a study
    Apply {
        /// Study archive the commands apply to
        #[arg(short, long)]
        archive: PathBuf,

        /// Command bundle to apply
        #[arg(short, long)]
        commands: PathBuf,

        /// Where to write the resulting study archive. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep applying commands after a failure
        #[arg(long)]
        continue_on_error: bool,
    },
    /// Compute the commands turning one command bundle into another
    Diff {
        /// Study archive both bundles apply to
        #[arg(short, long)]
        archive: PathBuf,

        /// Command bundle already applied
        #[arg(long)]
        base: PathBuf,

        /// Command bundle to reach
        #[arg(long)]
        variant: PathBuf,

        /// Where to write the diff bundle. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate several variants of one study concurrently
    Generate {
        /// Base study archive
        #[arg(short, long)]
        archive: PathBuf,

        /// Command bundles, one per variant
        #[arg(short, long, required = true)]
        commands: Vec<PathBuf>,

        /// Directory receiving one study archive per variant
        #[arg(long)]
        output_dir: PathBuf,

        /// Keep applying commands after a failure
        #[arg(long)]
        continue_on_error: bool,
    },
}

const fn policy(continue_on_error: bool) -> FailurePolicy {
    if continue_on_error {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    }
}

fn describe(failure: &CommandResultDetail) -> String {
    format!(
        "command {} ({}) failed: {}",
        failure.index, failure.signature, failure.message
    )
}

/// The variant name of a bundle file: its stem.
fn variant_name(path: &Path) -> String {
    path.file_stem().map_or_else(
        || path.display().to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}

async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Extract { archive, output } => {
            let archive: StudyArchive = read_json(&archive)?;
            let bundle: CommandBundle = run::extract(&archive)?;
            write_json(output.as_deref(), &bundle)
        }
        Action::Apply {
            archive,
            commands,
            output,
            continue_on_error,
        } => {
            let archive: StudyArchive = read_json(&archive)?;
            let bundle: CommandBundle = read_json(&commands)?;
            let replay: Replay = run::apply(&archive, &bundle, policy(continue_on_error))?;
            write_json(output.as_deref(), &replay.archive)?;
            if let Some(failure) = replay.report.first_failure() {
                bail!(describe(failure));
            }
            Ok(())
        }
        Action::Diff {
            archive,
            base,
            variant,
            output,
        } => {
            let archive: StudyArchive = read_json(&archive)?;
            let base: CommandBundle = read_json(&base)?;
            let variant: CommandBundle = read_json(&variant)?;
            let bundle: CommandBundle = run::diff(&archive, &base, &variant)?;
            info!(count = bundle.commands.len(), "Computed diff");
            write_json(output.as_deref(), &bundle)
        }
        Action::Generate {
            archive,
            commands,
            output_dir,
            continue_on_error,
        } => {
            let archive: StudyArchive = read_json(&archive)?;
            let mut variants: Vec<(String, CommandBundle)> = Vec::with_capacity(commands.len());
            for path in &commands {
                variants.push((variant_name(path), read_json(path)?));
            }
            std::fs::create_dir_all(&output_dir)
                .wrap_err_with(|| format!("Failed to create {}", output_dir.display()))?;

            let generated: Vec<GeneratedVariant> =
                run::generate(archive, variants, policy(continue_on_error)).await?;

            let mut failed: usize = 0;
            for variant in &generated {
                let path: PathBuf = output_dir.join(format!("{}.json", variant.name));
                write_json(Some(&path), &variant.replay)?;
                match variant.replay.report.first_failure() {
                    Some(failure) => {
                        failed += 1;
                        tracing::error!(variant = %variant.name, "{}", describe(failure));
                    }
                    None => info!(
                        variant = %variant.name,
                        path = %path.display(),
                        "Variant generated"
                    ),
                }
            }
            if failed > 0 {
                bail!("{failed} of {} variants failed", generated.len());
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    execute(args.action).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_generate_accepts_several_bundles() {
        let args: Args = Args::try_parse_from([
            "antares-variant",
            "generate",
            "--archive",
            "base.json",
            "-c",
            "north.json",
            "-c",
            "variants/south.json",
            "--output-dir",
            "out",
        ])
        .unwrap();

        let Action::Generate { commands, .. } = args.action else {
            panic!("expected the generate action");
        };
        let names: Vec<String> = commands.iter().map(|path| variant_name(path)).collect();
        assert_eq!(names, vec!["north", "south"]);
    }

    #[test]
    fn test_continue_on_error_selects_policy() {
        assert_eq!(policy(true), FailurePolicy::Continue);
        assert_eq!(policy(false), FailurePolicy::Abort);
    }
}
