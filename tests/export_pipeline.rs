use std::{fs, path::Path};

use serde_json::{json, Map, Value};
use uepkg::{
    export::{extract_and_save, ExportOutcome, ExportUnit, HierarchyExport},
    proxy::{
        values::{floats, strings},
        ProxyDeclaration, ProxyInstance, SchemaRegistry,
    },
    Error, Result,
};

const ITEM: &str = "/Script/ShooterGame.PrimalItem";

struct Items {
    totals: bool,
}

impl HierarchyExport for Items {
    fn name(&self) -> &str {
        "Items"
    }

    fn field(&self) -> &str {
        "items"
    }

    fn format_version(&self) -> &str {
        "3"
    }

    fn use_pretty(&self) -> bool {
        true
    }

    fn ue_type(&self) -> &str {
        ITEM
    }

    fn extract(&mut self, proxy: &ProxyInstance) -> Result<Option<Value>> {
        if proxy.get("DescriptiveNameBase", 0)?.as_str() == Some("Broken") {
            return Err(Error::Error("cannot export a broken item".into()));
        }

        let fields = proxy.export_fields(
            &[("DescriptiveNameBase", "name"), ("BaseItemWeight", "weight")],
            true,
        )?;
        Ok(Some(Value::Object(fields)))
    }

    fn post_data(&self, _unit: &ExportUnit, results: &[Value]) -> Map<String, Value> {
        let mut post = Map::new();
        if self.totals {
            post.insert("total".into(), json!(results.len()));
        }
        post
    }
}

fn registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry
        .register(
            ProxyDeclaration::new(ITEM)
                .field("DescriptiveNameBase", strings(["Item"]))
                .field("BaseItemWeight", floats([0.5_f32])),
        )
        .unwrap();
    registry
}

fn item(registry: &SchemaRegistry, name: Option<&str>, weight: Option<f32>) -> Result<ProxyInstance> {
    let mut proxy = registry.proxy_for_type(ITEM).unwrap();
    if let Some(name) = name {
        proxy.update([("DescriptiveNameBase", strings([name]))]);
    }
    if let Some(weight) = weight {
        proxy.update([("BaseItemWeight", floats([weight]))]);
    }
    Ok(proxy)
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn writes_only_overridden_values() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let mut stage = Items { totals: false };

    let proxies = vec![
        item(&registry, Some("Stone"), Some(1.0)),
        // Nothing overridden: skipped as empty
        item(&registry, None, None),
        item(&registry, Some("Wood"), None),
    ];
    let relative = stage.file_path(&ExportUnit::Core);
    let outcome = extract_and_save(
        &mut stage,
        "358.17.4519323",
        &ExportUnit::Core,
        dir.path(),
        &relative,
        proxies,
    )
    .unwrap();
    assert_eq!(outcome, ExportOutcome::Written);

    let path = dir.path().join("items.json");
    assert_eq!(
        read(&path),
        json!({
            "version": "358.17.4519323",
            "format": "3",
            "items": [
                {"name": "Stone", "weight": 1.0},
                {"name": "Wood"}
            ]
        })
    );

    // Key order follows the document layout
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.find("\"version\"").unwrap() < text.find("\"format\"").unwrap());
    assert!(text.find("\"format\"").unwrap() < text.find("\"items\"").unwrap());
}

#[test]
fn unchanged_documents_are_not_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let mut stage = Items { totals: false };
    let relative = stage.file_path(&ExportUnit::Core);

    let run = |stage: &mut Items| {
        extract_and_save(
            stage,
            "1.0",
            &ExportUnit::Core,
            dir.path(),
            &relative,
            vec![item(&registry, Some("Stone"), None)],
        )
        .unwrap()
    };
    assert_eq!(run(&mut stage), ExportOutcome::Written);
    assert_eq!(run(&mut stage), ExportOutcome::Unchanged);
}

#[test]
fn empty_results_remove_stale_documents() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let mut stage = Items { totals: false };
    let unit = ExportUnit::Mod {
        id: "839162288".into(),
        tag: "Super Structures".into(),
        title: Some("Super Structures".into()),
    };
    let relative = stage.file_path(&unit);
    let path = dir.path().join("839162288-Super_Structures").join("items.json");

    let outcome = extract_and_save(
        &mut stage,
        "1.0",
        &unit,
        dir.path(),
        &relative,
        vec![item(&registry, Some("Foundation"), None)],
    )
    .unwrap();
    assert_eq!(outcome, ExportOutcome::Written);
    assert_eq!(
        read(&path)["mod"],
        json!({"id": "839162288", "tag": "Super Structures", "title": "Super Structures"})
    );

    let outcome = extract_and_save(
        &mut stage,
        "1.0",
        &unit,
        dir.path(),
        &relative,
        vec![item(&registry, None, None)],
    )
    .unwrap();
    assert_eq!(outcome, ExportOutcome::Removed);
    assert!(!path.exists());

    let none: Vec<Result<ProxyInstance>> = Vec::new();
    let outcome = extract_and_save(&mut stage, "1.0", &unit, dir.path(), &relative, none).unwrap();
    assert_eq!(outcome, ExportOutcome::Skipped);
}

#[test]
fn post_data_keeps_documents() {
    let dir = tempfile::tempdir().unwrap();
    let mut stage = Items { totals: true };
    let relative = stage.file_path(&ExportUnit::Core);

    // A zero total is not content
    let outcome = extract_and_save(
        &mut stage,
        "1.0",
        &ExportUnit::Core,
        dir.path(),
        &relative,
        Vec::<Result<ProxyInstance>>::new(),
    )
    .unwrap();
    assert_eq!(outcome, ExportOutcome::Skipped);

    let registry = registry();
    let outcome = extract_and_save(
        &mut stage,
        "1.0",
        &ExportUnit::Core,
        dir.path(),
        &relative,
        vec![item(&registry, Some("Stone"), None)],
    )
    .unwrap();
    assert_eq!(outcome, ExportOutcome::Written);
    assert_eq!(read(&dir.path().join("items.json"))["total"], json!(1));
}

#[test]
fn extraction_errors_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let mut stage = Items { totals: false };
    let relative = stage.file_path(&ExportUnit::Core);

    let result = extract_and_save(
        &mut stage,
        "1.0",
        &ExportUnit::Core,
        dir.path(),
        &relative,
        vec![
            item(&registry, Some("Stone"), None),
            item(&registry, Some("Broken"), None),
        ],
    );
    assert!(matches!(result, Err(Error::Error(message)) if message.contains("broken")));
    assert!(!dir.path().join("items.json").exists());

    let result = extract_and_save(
        &mut stage,
        "1.0",
        &ExportUnit::Core,
        dir.path(),
        &relative,
        vec![Err(Error::PackageNotFound("/Game/Missing".into()))],
    );
    assert!(matches!(result, Err(Error::PackageNotFound(_))));
}
