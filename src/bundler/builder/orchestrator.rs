//! Main bundler orchestration and coordination.
//!
//! This module provides the [`Bundler`] orchestrator that turns one recipe
//! component into an on-disk bundle.

use super::{
    checksum::generate_checksums,
    result::{BundleResult, ResultBuilder},
};
use crate::{
    bundler::{
        Result, Settings,
        error::{Context, Error},
        template::{README_TEMPLATE, TemplateRenderer},
        utils::fs,
        values::{MergeReport, ValueTree, apply_node_selector, apply_overrides, apply_tolerations},
    },
    components::{Component, ManifestContext},
    metadata::{self, ConfigMap, keys},
    recipe::{ComponentRef, RecipeSource},
};
use std::{path::Path, time::Instant};
use tokio_util::sync::CancellationToken;

/// File name of the serialized Helm values.
pub const VALUES_FILE: &str = "values.yaml";

/// File name of the rendered documentation.
pub const README_FILE: &str = "README.md";

/// Assembles bundles for a single component.
///
/// A bundler borrows its component and the shared [`Settings`]; it holds no
/// per-build state, so one instance may build the same component repeatedly.
/// Each [`Bundler::bundle`] call owns its value tree, output directory and
/// result exclusively.
///
/// # Pipeline
///
/// 1. Fail fast if cancelled
/// 2. Resolve the component reference from the recipe
/// 3. Fetch base values from the recipe
/// 4. Apply overrides, then system and accelerated placement
/// 5. Recreate `<output>/<component>/`, dropping any previous bundle
/// 6. Build the flat metadata configuration
/// 7. Write `values.yaml`
/// 8. Run the component's manifest producer, if any
/// 9. Generate metadata and render `README.md` (if enabled)
/// 10. Write `checksums.txt` (if enabled)
/// 11. Finalize the [`BundleResult`]
///
/// Failures are terminal for the build. Files written before the failing
/// step are left on disk.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_helm::bundler::SettingsBuilder;
/// use kodegen_bundler_helm::components::ComponentRegistry;
/// use kodegen_bundler_helm::recipe::Recipe;
/// use tokio_util::sync::CancellationToken;
///
/// # fn example() -> kodegen_bundler_helm::bundler::Result<()> {
/// let registry = ComponentRegistry::builtin()?;
/// let settings = SettingsBuilder::new().build()?;
/// let recipe = Recipe::load("recipe.yaml".as_ref())?;
///
/// let bundler = registry.bundler("gpu-operator", &settings)?;
/// let result = bundler.bundle(&recipe, "bundles".as_ref(), &CancellationToken::new())?;
/// println!("{} files, {} bytes", result.files().len(), result.size());
/// # Ok(())
/// # }
/// ```
pub struct Bundler<'a> {
    component: &'a dyn Component,
    settings: &'a Settings,
    renderer: TemplateRenderer,
}

impl std::fmt::Debug for Bundler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("component", &self.component.descriptor().name)
            .field("settings", &self.settings)
            .finish()
    }
}

impl<'a> Bundler<'a> {
    /// Creates a bundler for `component`.
    pub fn new(component: &'a dyn Component, settings: &'a Settings) -> Self {
        Self {
            component,
            settings,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Returns the component this bundler builds.
    pub fn component(&self) -> &dyn Component {
        self.component
    }

    /// Builds the bundle under `output_dir/<component name>`.
    ///
    /// # Errors
    ///
    /// - invalid request: the recipe has no reference for the component, or
    ///   a manifest producer rejected its input
    /// - internal: value extraction, I/O, serialization, or rendering failed
    /// - timeout: `cancel` fired before or during the build
    pub fn bundle(
        &self,
        recipe: &dyn RecipeSource,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<BundleResult> {
        let started = Instant::now();
        let descriptor = self.component.descriptor();
        let name = descriptor.name;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled(format!("{name} bundle was not started")));
        }

        let component_ref = recipe.component_ref(name).ok_or_else(|| {
            Error::InvalidRequest(format!("component `{name}` not found in recipe"))
        })?;

        log::info!("Bundling {}", descriptor.display_name);

        let mut values = recipe
            .values_for_component(name)
            .with_context(|| format!("extracting values for {name}"))?;

        self.merge_values(&mut values);

        let bundle_dir = output_dir.join(name);
        fs::recreate_dir(&bundle_dir)
            .with_context(|| format!("preparing bundle directory for {name}"))?;
        let mut result = ResultBuilder::new(name, &bundle_dir);

        let config = self.metadata_config(component_ref, recipe);

        let values_path = bundle_dir.join(VALUES_FILE);
        let content = self.render_values_file(&values, &config)?;
        let size = fs::write_file(&values_path, content)
            .with_context(|| format!("writing values for {name}"))?;
        result.add_file(values_path, size);

        if let Some(producer) = self.component.manifests() {
            let ctx = ManifestContext {
                descriptor,
                bundle_dir: &bundle_dir,
                values: &values,
                config: &config,
                settings: self.settings,
                renderer: &self.renderer,
                cancel,
            };
            ctx.check_cancelled()?;

            let paths = producer
                .produce_manifests(&ctx)
                .with_context(|| format!("generating manifests for {name}"))?;
            for path in paths {
                let size = fs::file_size(&path)?;
                result.add_file(path, size);
            }
        }

        let metadata = metadata::generate(&config, self.component)
            .with_context(|| format!("generating metadata for {name}"))?;

        if self.settings.include_readme() {
            let readme = self
                .renderer
                .render(descriptor, README_TEMPLATE, &values, &metadata)
                .with_context(|| format!("rendering documentation for {name}"))?;
            let readme_path = bundle_dir.join(README_FILE);
            let size = fs::write_file(&readme_path, readme)?;
            result.add_file(readme_path, size);
        }

        if self.settings.include_checksums() {
            let path = generate_checksums(&bundle_dir, cancel)
                .with_context(|| format!("generating checksums for {name}"))?;
            let size = fs::file_size(&path)?;
            result.add_file(path, size);
        }

        let result = result.finish(started.elapsed());
        log::info!(
            "✓ Created {} bundle: {} ({} files, {} bytes)",
            name,
            bundle_dir.display(),
            result.files().len(),
            result.size()
        );

        Ok(result)
    }

    /// Applies overrides and placement policy to `values` in precedence
    /// order: component overrides, system node selector, system
    /// tolerations, accelerated node selector, accelerated tolerations.
    ///
    /// Overrides that cannot be applied are logged and skipped.
    pub fn merge_values(&self, values: &mut ValueTree) -> MergeReport {
        let descriptor = self.component.descriptor();

        let report = match self.settings.overrides_for(descriptor) {
            Some(overrides) => apply_overrides(values, overrides),
            None => MergeReport::default(),
        };
        for skipped in &report.skipped {
            log::warn!("{}: skipping override: {}", descriptor.name, skipped);
        }
        if self.settings.verbose() {
            for path in &report.applied {
                log::info!("{}: override {}", descriptor.name, path);
            }
        } else if !report.applied.is_empty() {
            log::debug!(
                "{}: applied {} override(s)",
                descriptor.name,
                report.applied.len()
            );
        }

        let system = self.settings.system_placement();
        apply_node_selector(values, &system.node_selector, descriptor.system_node_selector_paths);
        apply_tolerations(values, &system.tolerations, descriptor.system_toleration_paths);

        let accelerated = self.settings.accelerated_placement();
        apply_node_selector(
            values,
            &accelerated.node_selector,
            descriptor.accelerated_node_selector_paths,
        );
        apply_tolerations(
            values,
            &accelerated.tolerations,
            descriptor.accelerated_toleration_paths,
        );

        report
    }

    /// Builds the flat configuration handed to metadata and manifest
    /// producers.
    fn metadata_config(&self, component_ref: &ComponentRef, recipe: &dyn RecipeSource) -> ConfigMap {
        let descriptor = self.component.descriptor();
        let mut config = ConfigMap::new();

        let mut set = |key: &str, value: Option<&str>, default: &str| {
            let value = value.filter(|v| !v.is_empty()).unwrap_or(default);
            config.insert(key.to_string(), value.to_string());
        };
        set(
            keys::NAMESPACE,
            component_ref.namespace.as_deref(),
            descriptor.default_namespace,
        );
        set(
            keys::HELM_REPOSITORY,
            component_ref.source.as_deref(),
            descriptor.default_helm_repository,
        );
        set(
            keys::HELM_CHART,
            component_ref.chart.as_deref(),
            descriptor.default_helm_chart,
        );
        set(
            keys::HELM_CHART_VERSION,
            component_ref.version.as_deref(),
            descriptor.default_helm_chart_version,
        );
        set(keys::BUNDLER_VERSION, Some(self.settings.bundler_version()), "");

        if let Some(version) = recipe.version() {
            config.insert(keys::RECIPE_VERSION.to_string(), version.to_string());
        }
        if let Some(accelerator) = recipe.criteria().and_then(|c| c.accelerator.as_deref()) {
            config.insert(keys::ACCELERATOR.to_string(), accelerator.to_string());
        }

        config
    }

    /// Serializes `values` with a descriptive header.
    fn render_values_file(&self, values: &ValueTree, config: &ConfigMap) -> Result<String> {
        let descriptor = self.component.descriptor();
        let get = |key: &str| config.get(key).map(String::as_str).unwrap_or("");

        let chart = get(keys::HELM_CHART);
        let chart_name = chart.rsplit('/').next().unwrap_or(chart);

        let mut out = String::new();
        out.push_str(&format!("# {} Helm values\n", descriptor.display_name));
        out.push_str(&format!(
            "# Generated by {} {}\n",
            env!("CARGO_PKG_NAME"),
            get(keys::BUNDLER_VERSION)
        ));
        out.push_str("#\n");
        out.push_str(&format!(
            "# Chart:     {} {} ({})\n",
            chart,
            get(keys::HELM_CHART_VERSION),
            get(keys::HELM_REPOSITORY)
        ));
        out.push_str(&format!("# Namespace: {}\n", get(keys::NAMESPACE)));
        if let Some(version) = config.get(keys::RECIPE_VERSION) {
            out.push_str(&format!("# Recipe:    {version}\n"));
        }
        if let Some(accelerator) = config.get(keys::ACCELERATOR) {
            out.push_str(&format!("# Accelerator: {accelerator}\n"));
        }
        out.push_str("#\n");
        out.push_str(&format!(
            "# helm upgrade --install {} {} --repo {} --version {} \\\n#   --namespace {} --create-namespace -f {}\n",
            descriptor.name,
            chart_name,
            get(keys::HELM_REPOSITORY),
            get(keys::HELM_CHART_VERSION),
            get(keys::NAMESPACE),
            VALUES_FILE
        ));
        out.push('\n');

        let body = serde_yaml::to_string(values)
            .with_context(|| format!("serializing values for {}", descriptor.name))?;
        out.push_str(&body);

        Ok(out)
    }
}
