//! Command line interface for the Helm bundler.
//!
//! Loads the recipe and settings once, then builds every selected component
//! concurrently on the blocking thread pool. Ctrl-C cancels in-flight builds.

mod args;
mod output;

pub use args::{Args, ValueOverride, parse_override};
pub use output::OutputManager;

use crate::bundler::{BundleResult, Settings, SettingsFile};
use crate::components::ComponentRegistry;
use crate::error::{BundlerError, CliError, Result};
use crate::recipe::Recipe;
use std::{path::PathBuf, sync::Arc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome of one component build.
pub type BuildOutcome = (String, Result<BundleResult>);

/// Main CLI entry point
///
/// Returns the process exit code: 0 when every bundle was written, 1 when
/// any build failed, 130 if the run was interrupted.
pub async fn run(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let output = OutputManager::new(args.verbose);
    let registry = Arc::new(ComponentRegistry::builtin()?);

    if args.list_components {
        for name in registry.names() {
            if let Some(component) = registry.get(name) {
                output.line(&format!("{name:<20} {}", component.descriptor().display_name))?;
            }
        }
        return Ok(0);
    }

    let recipe_path = args.recipe.clone().ok_or_else(|| CliError::MissingArgument {
        argument: "--recipe".to_string(),
    })?;

    let file = match &args.config {
        Some(path) => {
            log::debug!("Loading configuration from {}", path.display());
            Some(SettingsFile::load(path)?)
        }
        None => None,
    };
    let settings = Arc::new(args.settings_builder(file)?.build()?);

    let recipe = Arc::new(Recipe::load(&recipe_path)?);
    let components = select_components(&args, &recipe, &registry)?;
    if components.is_empty() {
        return Err(CliError::InvalidArguments {
            reason: format!("recipe {} has no components to bundle", recipe_path.display()),
        }
        .into());
    }

    output.verbose(&format!(
        "Bundling {} component(s) into {}",
        components.len(),
        args.output.display()
    ))?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, cancelling in-flight builds");
                cancel.cancel();
            }
        })
    };

    let outcomes = build_all(
        registry,
        settings,
        recipe,
        components,
        args.output.clone(),
        cancel.clone(),
    )
    .await;
    interrupt.abort();

    report(&output, &outcomes, cancel.is_cancelled())
}

/// Resolves which components to build.
///
/// Explicit `--component` names must be registered. Without any, every
/// recipe component the registry knows is selected and the rest are
/// skipped with a warning.
fn select_components(
    args: &Args,
    recipe: &Recipe,
    registry: &ComponentRegistry,
) -> Result<Vec<String>> {
    if !args.components.is_empty() {
        if let Some(unknown) = args.components.iter().find(|c| !registry.contains(c)) {
            return Err(CliError::InvalidArguments {
                reason: format!(
                    "unknown component `{unknown}` (known: {})",
                    registry.names().join(", ")
                ),
            }
            .into());
        }
        return Ok(args.components.clone());
    }

    Ok(recipe
        .component_names()
        .into_iter()
        .filter(|name| {
            let known = registry.contains(name);
            if !known {
                log::warn!("Skipping unsupported recipe component `{name}`");
            }
            known
        })
        .map(String::from)
        .collect())
}

/// Builds `components` concurrently and returns outcomes sorted by name.
pub async fn build_all(
    registry: Arc<ComponentRegistry>,
    settings: Arc<Settings>,
    recipe: Arc<Recipe>,
    components: Vec<String>,
    output_dir: PathBuf,
    cancel: CancellationToken,
) -> Vec<BuildOutcome> {
    let mut tasks = JoinSet::new();

    for name in components {
        let registry = Arc::clone(&registry);
        let settings = Arc::clone(&settings);
        let recipe = Arc::clone(&recipe);
        let output_dir = output_dir.clone();
        let cancel = cancel.clone();

        tasks.spawn_blocking(move || {
            let result = registry
                .bundler(&name, &settings)
                .and_then(|bundler| bundler.bundle(recipe.as_ref(), &output_dir, &cancel))
                .map_err(BundlerError::from);
            (name, result)
        });
    }

    let mut outcomes: Vec<BuildOutcome> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => outcomes.push((
                "<unknown>".to_string(),
                Err(anyhow::Error::new(e).context("bundle task did not complete").into()),
            )),
        }
    }

    outcomes.sort_by(|a, b| a.0.cmp(&b.0));
    outcomes
}

fn report(output: &OutputManager, outcomes: &[BuildOutcome], interrupted: bool) -> Result<i32> {
    output.section("Bundles")?;

    let mut failed = 0;
    for (name, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                output.success(&format!(
                    "{name}: {} ({} files, {} bytes, {:.2?})",
                    result.bundle_dir().display(),
                    result.files().len(),
                    result.size(),
                    result.duration()
                ))?;
                for file in result.files() {
                    output.verbose(&format!("    {}", file.display()))?;
                }
            }
            Err(e) => {
                failed += 1;
                output.failure(&format!("{name}: {e} [{}]", e.kind()))?;
            }
        }
    }

    if failed > 0 {
        output.indent(&format!("{failed} of {} bundle(s) failed", outcomes.len()))?;
    }

    Ok(match (interrupted, failed) {
        (true, _) => 130,
        (false, 0) => 0,
        (false, _) => 1,
    })
}
