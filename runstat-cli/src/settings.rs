// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Merge command-line flags over profile defaults.

use runstat_core::{
    resolve_env, BenchConfig, DropPercent, EnvSpec, Invocation, MeasureMode, Parallelism,
    Profile, ProfileLoader, TrialCount,
};

use crate::error::CliResult;
use crate::Cli;

/// Build the run configuration and the child invocation.
///
/// `lookup` reads variables from the controller's own environment.
pub fn resolve<F>(cli: &Cli, lookup: F) -> CliResult<(BenchConfig, Invocation)>
where
    F: Fn(&str) -> Option<String>,
{
    let profile = match &cli.profile {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading profile");
            ProfileLoader::load_file(path)?
        }
        None => Profile::default(),
    };

    let count = match cli.count {
        Some(n) => TrialCount::new(n)?,
        None => profile.count,
    };
    let parallelism = match cli.parallel {
        Some(n) => Parallelism::new(n)?,
        None => profile.parallelism,
    };
    let drop = match cli.drop {
        Some(n) => DropPercent::new(n)?,
        None => profile.drop,
    };

    let mode = if cli.relocations {
        MeasureMode::Relocation {
            log_dir: profile.relocation_log_dir.clone(),
        }
    } else {
        MeasureMode::Duration
    };

    let mut specs = profile.environment;
    for spec in &cli.env {
        specs.push(EnvSpec::parse(spec)?);
    }
    let env = resolve_env(&specs, &mode, lookup);

    let invocation = Invocation::new(cli.command.clone())?.with_env(env);
    let config = BenchConfig {
        count,
        parallelism,
        drop,
        mode,
        ignore_status: cli.ignore || profile.ignore_status,
    };

    Ok((config, invocation))
}
