mod common;

use std::sync::Arc;
use std::thread;

use common::{registry, Cpu, Disk, Domain, Graphics};
use xmlbind::{
    ChildProperty, Declaration, DocumentAdapter, DocumentError, Error, Field, Instance, Property,
    Registry, Schema, TrackingObserver,
};

struct ConflictingConversions;
impl Schema for ConflictingConversions {
    const ROOT_NAME: &'static str = "conflict";
    fn declare(decl: &mut Declaration) {
        decl.property("flag", Property::new("./@flag").int().yes_no());
    }
}

struct SameChildTwice;
impl Schema for SameChildTwice {
    const ROOT_NAME: &'static str = "twice";
    fn declare(decl: &mut Declaration) {
        decl.child("cpus", ChildProperty::many::<Cpu>("./cpus"))
            .child("cpu", ChildProperty::single::<Cpu>("."));
    }
}

struct UnknownOrder;
impl Schema for UnknownOrder {
    const ROOT_NAME: &'static str = "order";
    const PROP_ORDER: &'static [&'static str] = &["name", "missing"];
    fn declare(decl: &mut Declaration) {
        decl.property("name", Property::new("./name"));
    }
}

struct SentinelWithoutDefault;
impl Schema for SentinelWithoutDefault {
    const ROOT_NAME: &'static str = "sentinel";
    fn declare(decl: &mut Declaration) {
        decl.property("mode", Property::new("./@mode").default_name("default"));
    }
}

struct BadPath;
impl Schema for BadPath {
    const ROOT_NAME: &'static str = "bad";
    fn declare(decl: &mut Declaration) {
        decl.property("first", Property::new("./disk[0]/@type"));
    }
}

struct BrokenChild;
impl Schema for BrokenChild {
    const ROOT_NAME: &'static str = "holder";
    fn declare(decl: &mut Declaration) {
        decl.child("items", ChildProperty::many::<ConflictingConversions>("."));
    }
}

fn config_error<S: Schema>(registry: &Arc<Registry>) -> String {
    match Instance::<S>::new_in(registry) {
        Err(Error::Config(msg)) => msg,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn declaration_errors_are_reported_at_first_use() {
    let registry = registry();
    assert!(config_error::<ConflictingConversions>(&registry).contains("conflicting"));
    assert!(config_error::<SameChildTwice>(&registry).contains("more than one child field"));
    assert!(config_error::<UnknownOrder>(&registry).contains("missing"));
    assert!(config_error::<SentinelWithoutDefault>(&registry).contains("default_name"));
    assert!(config_error::<BadPath>(&registry).contains("invalid path"));
    assert!(config_error::<BrokenChild>(&registry).contains("conflicting"));
    assert!(registry.schemas().iter().all(|info| !info.type_name().ends_with("ConflictingConversions")));
}

#[test]
fn inheritance_overrides_in_place() {
    let registry = registry();
    let info = registry.schema::<Disk>().unwrap();
    let names: Vec<_> = info.fields().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        vec!["alias", "kind", "device", "driver_name", "path", "readonly", "shareable"]
    );
    match info.field("kind") {
        Some(Field::Scalar(prop)) => assert_eq!(prop.expr(), "./@type"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn descriptors_map_back_to_field_names() {
    let registry = registry();
    let info = registry.schema::<Domain>().unwrap();
    for (name, prop) in info.properties() {
        assert_eq!(info.property_name(prop).unwrap(), name);
    }
    for (name, child) in info.child_properties() {
        assert_eq!(info.child_property_name(child).unwrap(), name);
    }
    let stray = Arc::new(Property::new("./name"));
    assert!(matches!(info.property_name(&stray), Err(Error::Config(_))));
}

#[test]
fn concurrent_first_use_yields_one_table() {
    let registry = registry();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || registry.schema::<Domain>().unwrap())
        })
        .collect();
    let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for table in &tables {
        assert!(Arc::ptr_eq(table, &tables[0]));
    }
    assert!(Arc::ptr_eq(&tables[0], &registry.schema::<Domain>().unwrap()));
}

#[test]
fn observer_reports_untouched_fields() {
    let tracker = Arc::new(TrackingObserver::new());
    let registry = Arc::new(Registry::default().with_observer(tracker.clone()));
    let mut gfx = Instance::<Graphics>::new_in(&registry).unwrap();
    gfx.get("kind").unwrap();
    gfx.set("listen", "::1").unwrap();
    gfx.render().unwrap();

    let name = registry.schema::<Graphics>().unwrap().type_name();
    assert_eq!(tracker.seen(), vec![(name, "kind"), (name, "listen")]);
    assert_eq!(tracker.unseen(&registry), vec![(name, "keymap")]);
}

fn refusing_factory(content: &str) -> Result<Box<dyn DocumentAdapter>, DocumentError> {
    if content.contains("secret") {
        return Err(DocumentError::NotFound("secret".into()));
    }
    xmlbind::tree_factory(content)
}

#[test]
fn custom_document_factory() {
    let registry = Arc::new(Registry::default().with_factory(refusing_factory));
    let dom = Instance::<Domain>::parse_in(&registry, "<domain><name>open</name></domain>").unwrap();
    assert_eq!(dom.get_str("name").unwrap().as_deref(), Some("open"));

    match Instance::<Domain>::parse_in(&registry, "<domain><name>secret</name></domain>") {
        Err(Error::Parse { source, .. }) => {
            assert_eq!(source, DocumentError::NotFound("secret".into()))
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn global_registry_instances() {
    let dom = Instance::<Domain>::new().unwrap();
    assert!(Arc::ptr_eq(dom.registry(), &Registry::global()));
    let parsed = Instance::<Domain>::parse("<domain><name>g</name></domain>").unwrap();
    assert_eq!(parsed.get_str("name").unwrap().as_deref(), Some("g"));
}
