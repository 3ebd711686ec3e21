//! End-to-end tests for bundle assembly through the library API.

use kodegen_bundler_helm::bundler::{
    CHECKSUMS_FILE, ErrorKind, README_FILE, SettingsBuilder, VALUES_FILE, ValueTree,
    values::get_value_by_path,
};
use kodegen_bundler_helm::components::{
    Component, ComponentDescriptor, ComponentRegistry, RegistryBuilder,
};
use kodegen_bundler_helm::recipe::Recipe;
use serde_yaml::Value;
use std::{fs, path::Path};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

fn fixture_recipe() -> Recipe {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/recipe.yaml");
    Recipe::load(&path).unwrap()
}

fn read_values(bundle_dir: &Path) -> ValueTree {
    let content = fs::read_to_string(bundle_dir.join(VALUES_FILE)).unwrap();
    serde_yaml::from_str(&content).unwrap()
}

fn string_at<'a>(tree: &'a ValueTree, path: &str) -> Option<&'a str> {
    get_value_by_path(tree, path).and_then(Value::as_str)
}

const PLACEMENT_DEMO: ComponentDescriptor = ComponentDescriptor {
    name: "placement-demo",
    display_name: "Placement Demo",
    override_keys: &[],
    system_node_selector_paths: &["a.b"],
    system_toleration_paths: &[],
    accelerated_node_selector_paths: &["a.b"],
    accelerated_toleration_paths: &[],
    default_namespace: "demo",
    default_helm_repository: "https://charts.example.com",
    default_helm_chart: "example/demo",
    default_helm_chart_version: "v1.0.0",
    templates: demo_templates,
};

fn demo_templates(name: &str) -> Option<&'static str> {
    match name {
        "README.md" => Some("# {{metadata.namespace}}\n"),
        _ => None,
    }
}

struct PlacementDemo;

impl Component for PlacementDemo {
    fn descriptor(&self) -> &ComponentDescriptor {
        &PLACEMENT_DEMO
    }
}

#[test]
fn gpu_operator_bundle_has_values_manifests_docs_and_checksums() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new()
        .value_override("gpuoperator", "driver.rdma.enabled", "true")
        .system_node_selector("nodeGroup", "system")
        .accelerated_node_selector("nodeGroup", "gpu")
        .accelerated_node_toleration("dedicated=gpu:NoSchedule".parse().unwrap())
        .build()
        .unwrap();

    let result = registry
        .bundler("gpu-operator", &settings)
        .unwrap()
        .bundle(&fixture_recipe(), out.path(), &CancellationToken::new())
        .unwrap();

    let bundle_dir = out.path().join("gpu-operator");
    assert_eq!(result.component(), "gpu-operator");
    assert_eq!(result.bundle_dir(), bundle_dir);
    assert_eq!(result.files().len(), 4);
    let total: u64 = result
        .files()
        .iter()
        .map(|f| fs::metadata(f).unwrap().len())
        .sum();
    assert_eq!(result.size(), total);

    let values = read_values(&bundle_dir);
    // inline recipe values beat the values file
    assert_eq!(string_at(&values, "driver.version"), Some("570.86.15"));
    // override coerced to the existing boolean
    assert_eq!(
        get_value_by_path(&values, "driver.rdma.enabled"),
        Some(&Value::Bool(true))
    );
    assert_eq!(string_at(&values, "operator.nodeSelector.nodeGroup"), Some("system"));
    assert_eq!(string_at(&values, "daemonsets.nodeSelector.nodeGroup"), Some("gpu"));
    assert_eq!(
        string_at(&values, "node-feature-discovery.worker.nodeSelector.nodeGroup"),
        Some("gpu")
    );
    assert!(get_value_by_path(&values, "operator.tolerations").is_none());
    assert_eq!(
        get_value_by_path(&values, "daemonsets.tolerations")
            .and_then(Value::as_sequence)
            .map(Vec::len),
        Some(1)
    );

    let manifest = fs::read_to_string(bundle_dir.join("manifests/dcgm-metrics.yaml")).unwrap();
    let manifest: Value = serde_yaml::from_str(&manifest).unwrap();
    assert_eq!(string_at(&manifest, "metadata.name"), Some("dcgm-metrics"));
    assert_eq!(string_at(&manifest, "metadata.namespace"), Some("gpu-operator"));

    let readme = fs::read_to_string(bundle_dir.join(README_FILE)).unwrap();
    assert!(readme.contains("`h100`"));
    assert!(readme.contains("--version v25.3.0"));

    let checksums = fs::read_to_string(bundle_dir.join(CHECKSUMS_FILE)).unwrap();
    let listed: Vec<&str> = checksums
        .lines()
        .map(|l| l.split_once(' ').unwrap().0)
        .collect();
    assert_eq!(
        listed,
        vec![README_FILE, "manifests/dcgm-metrics.yaml", VALUES_FILE]
    );
    for line in checksums.lines() {
        let digest = line.split_once(' ').unwrap().1;
        assert_eq!(digest.len(), 64);
    }
}

#[test]
fn placement_tiers_apply_after_overrides() {
    let registry = RegistryBuilder::new().register(PlacementDemo).build().unwrap();
    let settings = SettingsBuilder::new()
        .value_override("placement-demo", "a.b", "1")
        .system_node_selector("zone", "system")
        .accelerated_node_selector("zone", "gpu")
        .build()
        .unwrap();
    let recipe = Recipe::parse("componentRefs:\n  - name: placement-demo\n").unwrap();

    let out = tempdir().unwrap();
    registry
        .bundler("placement-demo", &settings)
        .unwrap()
        .bundle(&recipe, out.path(), &CancellationToken::new())
        .unwrap();

    let values = read_values(&out.path().join("placement-demo"));
    let expected: ValueTree = serde_yaml::from_str("a: {b: {zone: gpu}}").unwrap();
    assert_eq!(values, expected);
}

#[test]
fn merge_values_reports_skipped_overrides() {
    let registry = RegistryBuilder::new().register(PlacementDemo).build().unwrap();
    let settings = SettingsBuilder::new()
        .value_override("placement-demo", "a", "scalar")
        .value_override("placement-demo", "a.b", "nested")
        .build()
        .unwrap();

    let mut values = ValueTree::Mapping(Default::default());
    let report = registry
        .bundler("placement-demo", &settings)
        .unwrap()
        .merge_values(&mut values);

    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(string_at(&values, "a"), Some("scalar"));
}

#[test]
fn missing_component_ref_is_invalid_request() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new().build().unwrap();

    let err = registry
        .bundler("network-operator", &settings)
        .unwrap()
        .bundle(&fixture_recipe(), out.path(), &CancellationToken::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn unknown_component_is_invalid_request() {
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new().build().unwrap();
    let err = registry.bundler("kube-prometheus", &settings).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[test]
fn cancelled_build_writes_nothing() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new().build().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = registry
        .bundler("cert-manager", &settings)
        .unwrap()
        .bundle(&fixture_recipe(), out.path(), &cancel)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn disabled_docs_still_write_values_and_checksums() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new().include_readme(false).build().unwrap();

    let result = registry
        .bundler("cert-manager", &settings)
        .unwrap()
        .bundle(&fixture_recipe(), out.path(), &CancellationToken::new())
        .unwrap();

    let bundle_dir = out.path().join("cert-manager");
    assert!(!bundle_dir.join(README_FILE).exists());
    assert!(bundle_dir.join(VALUES_FILE).exists());
    assert!(bundle_dir.join(CHECKSUMS_FILE).exists());
    assert_eq!(result.files().len(), 2);

    let checksums = fs::read_to_string(bundle_dir.join(CHECKSUMS_FILE)).unwrap();
    assert_eq!(checksums.lines().count(), 1);
    assert!(checksums.starts_with("values.yaml "));
}

#[test]
fn rebuild_without_docs_drops_previous_readme() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let recipe = fixture_recipe();

    let with_docs = SettingsBuilder::new().build().unwrap();
    registry
        .bundler("cert-manager", &with_docs)
        .unwrap()
        .bundle(&recipe, out.path(), &CancellationToken::new())
        .unwrap();
    let bundle_dir = out.path().join("cert-manager");
    assert!(bundle_dir.join(README_FILE).exists());

    let without_docs = SettingsBuilder::new().include_readme(false).build().unwrap();
    let result = registry
        .bundler("cert-manager", &without_docs)
        .unwrap()
        .bundle(&recipe, out.path(), &CancellationToken::new())
        .unwrap();

    assert!(!bundle_dir.join(README_FILE).exists());
    assert_eq!(result.files().len(), 2);
    let checksums = fs::read_to_string(bundle_dir.join(CHECKSUMS_FILE)).unwrap();
    assert_eq!(checksums.lines().count(), 1);
    assert!(checksums.starts_with("values.yaml "));
}

#[test]
fn rebuild_drops_stale_manifests() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let recipe = fixture_recipe();

    let settings = SettingsBuilder::new().build().unwrap();
    registry
        .bundler("skyhook-operator", &settings)
        .unwrap()
        .bundle(&recipe, out.path(), &CancellationToken::new())
        .unwrap();
    let resource = out.path().join("skyhook-operator/manifests/skyhook.yaml");
    assert!(resource.exists());

    let recipe_without = Recipe::parse(
        "componentRefs:\n  - name: skyhook-operator\n    values:\n      controllerManager: {}\n",
    )
    .unwrap();
    let result = registry
        .bundler("skyhook-operator", &settings)
        .unwrap()
        .bundle(&recipe_without, out.path(), &CancellationToken::new())
        .unwrap();

    assert!(!resource.exists());
    assert!(!result.files().contains(&resource));
    let checksums =
        fs::read_to_string(out.path().join("skyhook-operator").join(CHECKSUMS_FILE)).unwrap();
    assert!(!checksums.contains("manifests/"));
}

#[test]
fn disabled_checksums_skip_manifest() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new().include_checksums(false).build().unwrap();

    let result = registry
        .bundler("cert-manager", &settings)
        .unwrap()
        .bundle(&fixture_recipe(), out.path(), &CancellationToken::new())
        .unwrap();

    assert!(!out.path().join("cert-manager").join(CHECKSUMS_FILE).exists());
    assert_eq!(result.files().len(), 2);
}

#[test]
fn identical_inputs_produce_identical_bundles() {
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new()
        .bundler_version("1.2.3")
        .system_node_selector("nodeGroup", "system")
        .build()
        .unwrap();
    let recipe = fixture_recipe();

    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    for out in [&first, &second] {
        registry
            .bundler("gpu-operator", &settings)
            .unwrap()
            .bundle(&recipe, out.path(), &CancellationToken::new())
            .unwrap();
    }

    let read = |dir: &Path| fs::read_to_string(dir.join("gpu-operator").join(CHECKSUMS_FILE)).unwrap();
    assert_eq!(read(first.path()), read(second.path()));
}

#[test]
fn nvsentinel_renders_custom_metadata() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new().bundler_version("1.2.3").build().unwrap();
    let recipe = Recipe::parse(
        "version: v0.9.0\ncomponentRefs:\n  - name: nvsentinel\n    namespace: health\n",
    )
    .unwrap();

    registry
        .bundler("nvsentinel", &settings)
        .unwrap()
        .bundle(&recipe, out.path(), &CancellationToken::new())
        .unwrap();

    let readme = fs::read_to_string(out.path().join("nvsentinel").join(README_FILE)).unwrap();
    assert!(readme.contains("--namespace health"));
    assert!(readme.contains("`gpu-health-monitor`"));
    assert!(readme.contains("Generated by bundler 1.2.3 from recipe v0.9.0."));
}

#[test]
fn skyhook_tuning_writes_custom_resource() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new()
        .accelerated_node_selector("nodeGroup", "gpu")
        .build()
        .unwrap();

    let result = registry
        .bundler("skyhook-operator", &settings)
        .unwrap()
        .bundle(&fixture_recipe(), out.path(), &CancellationToken::new())
        .unwrap();

    let resource = out.path().join("skyhook-operator/manifests/skyhook.yaml");
    assert!(result.files().contains(&resource));
    let resource: Value = serde_yaml::from_str(&fs::read_to_string(&resource).unwrap()).unwrap();
    assert_eq!(string_at(&resource, "metadata.name"), Some("tuning"));
}

#[test]
fn skyhook_unknown_customization_fails_build() {
    let out = tempdir().unwrap();
    let registry = ComponentRegistry::builtin().unwrap();
    let settings = SettingsBuilder::new()
        .value_override("skyhook", "customization", "overclock")
        .build()
        .unwrap();

    let err = registry
        .bundler("skyhook-operator", &settings)
        .unwrap()
        .bundle(&fixture_recipe(), out.path(), &CancellationToken::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}
