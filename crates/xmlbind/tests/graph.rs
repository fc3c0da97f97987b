mod common;

use common::{registry, Cpu, Disk, Domain, Graphics, GUEST};
use xmlbind::{Error, Instance, Value};

#[test]
fn list_members_know_their_position() {
    let registry = registry();
    let dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    let disks = dom.children("disks").unwrap();
    assert_eq!(disks.len(), 2);
    assert_eq!(disks[0].xml_id(), "./devices/disk[1]");
    assert_eq!(disks[1].xml_id(), "./devices/disk[2]");
    assert_eq!(disks[1].xml_idx(), 1);
    assert_eq!(disks[1].get("kind").unwrap(), Value::from("block"));
    assert_eq!(dom.children("interfaces").unwrap()[0].xml_id(), "./devices/interface[1]");
    assert_eq!(dom.xml_id(), ".");
    assert_eq!(dom.xml_idx(), 0);
}

#[test]
fn detach_then_attach_restores_position_and_content() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    let position = dom.children("disks").unwrap()[1].xml_id();
    let fragment = dom.children("disks").unwrap()[1].render().unwrap();
    assert_eq!(fragment, "<disk type=\"block\" device=\"cdrom\"/>\n");

    let disk = dom.detach("disks", 1).unwrap();
    assert!(disk.owns_document());
    assert_eq!(disk.xml_id(), ".");
    assert_eq!(disk.render().unwrap(), fragment);
    assert_eq!(dom.children("disks").unwrap().len(), 1);

    let disk = dom.attach(disk).unwrap();
    assert!(!disk.owns_document());
    assert_eq!(disk.xml_id(), position);
    assert_eq!(disk.render().unwrap(), fragment);

    let xml = dom.render().unwrap();
    assert!(xml.contains(
        "    </disk>\n    <disk type=\"block\" device=\"cdrom\"/>\n    <interface"
    ));
    let reparsed = Instance::<Domain>::parse_in(&registry, &xml).unwrap();
    let kinds: Vec<_> = reparsed
        .children("disks")
        .unwrap()
        .iter()
        .map(|d| d.get("kind").unwrap())
        .collect();
    assert_eq!(kinds, vec![Value::from("file"), Value::from("block")]);
    assert_eq!(reparsed.children("interfaces").unwrap().len(), 1);
}

#[test]
fn detach_renumbers_the_rest() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    let iface_id = dom.children("interfaces").unwrap()[0].xml_id();

    let first = dom.detach_as::<Disk>(0).unwrap();
    assert_eq!(first.get("path").unwrap(), Value::from("/var/lib/a.img"));

    let disks = dom.children("disks").unwrap();
    assert_eq!(disks.len(), 1);
    assert_eq!(disks[0].xml_id(), "./devices/disk[1]");
    assert_eq!(disks[0].get("kind").unwrap(), Value::from("block"));
    assert_eq!(dom.children("interfaces").unwrap()[0].xml_id(), iface_id);

    let moved = dom.attach(first).unwrap();
    assert_eq!(moved.xml_id(), "./devices/disk[2]");
    assert_eq!(moved.get("path").unwrap(), Value::from("/var/lib/a.img"));
    moved.set("path", "/var/lib/b.img").unwrap();

    let xml = dom.render().unwrap();
    let devices = &xml[xml.find("<devices>").unwrap()..];
    assert_eq!(
        devices,
        r#"<devices>
    <interface type="network" trustGuestRxFilters="yes">
      <mac address="52:54:00:aa:bb:cc"/>
      <link state="off"/>
      <boot order="0x10"/>
    </interface>
    <disk type="block" device="cdrom"/>
    <disk type="file" device="disk">
      <source file="/var/lib/b.img"/>
    </disk>
  </devices>
</domain>
"#
    );
}

#[test]
fn built_children_join_parsed_parents() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    let iface_id = dom.children("interfaces").unwrap()[0].xml_id();

    let disk = dom.add_new("disks").unwrap();
    assert!(disk.is_build());
    assert_eq!(disk.xml_id(), "./devices/disk[3]");
    assert_eq!(disk.get("device").unwrap(), Value::from("disk"));
    disk.set("kind", "file").unwrap();
    disk.set("path", "/srv/new.img").unwrap();
    let expected = "<disk type=\"file\" device=\"disk\">\n  <source file=\"/srv/new.img\"/>\n</disk>\n";
    assert_eq!(disk.render().unwrap(), expected);

    let xml = dom.render().unwrap();
    assert!(xml.contains(
        "    <disk type=\"block\" device=\"cdrom\"/>\n    <disk type=\"file\" device=\"disk\">\n      <source file=\"/srv/new.img\"/>\n    </disk>\n  </devices>"
    ));
    assert_eq!(dom.children("interfaces").unwrap()[0].xml_id(), iface_id);
    assert_eq!(dom.children("disks").unwrap()[2].render().unwrap(), expected);
}

#[test]
fn attach_parsed_standalone_instance() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    let disk = Instance::<Disk>::parse_in(
        &registry,
        "<disk type='network'><source file='/z.img'/></disk>",
    )
    .unwrap();
    let disk = dom.attach(disk).unwrap();
    assert!(!disk.is_build());
    assert_eq!(disk.xml_id(), "./devices/disk[3]");
    assert_eq!(disk.get("kind").unwrap(), Value::from("network"));

    let reparsed = Instance::<Domain>::parse_in(&registry, &dom.render().unwrap()).unwrap();
    let disks = reparsed.children("disks").unwrap();
    assert_eq!(disks.len(), 3);
    assert_eq!(disks[2].get("path").unwrap(), Value::from("/z.img"));
}

#[test]
fn attach_requires_a_list_field() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    let gfx = Instance::<Graphics>::new_in(&registry).unwrap();
    assert!(matches!(dom.attach(gfx), Err(Error::Config(_))));
    assert!(matches!(dom.new_child("cpu"), Err(Error::Config(_))));
}

#[test]
fn typed_detach_checks_the_type() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    let disk = dom.detach("disks", 0).unwrap();
    assert!(disk.is::<Disk>());
    match Instance::<Cpu>::from_node(disk) {
        Err(Error::TypeMismatch { found, .. }) => assert!(found.ends_with("Disk")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn reset_list_member_leaves_a_stub() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    dom.children_mut("disks").unwrap()[0].reset(false).unwrap();

    let disks = dom.children("disks").unwrap();
    assert_eq!(disks[0].get("kind").unwrap(), Value::Null);
    assert_eq!(disks[1].xml_id(), "./devices/disk[2]");
    assert_eq!(disks[1].get("kind").unwrap(), Value::from("block"));

    let xml = dom.render().unwrap();
    assert!(xml.contains("  <devices>\n    <disk/>\n    <interface"));
}

#[test]
fn reset_root_removes_it() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    dom.set("name", "gone").unwrap();
    dom.reset(false).unwrap();
    assert_eq!(dom.get("name").unwrap(), Value::Null);
    assert!(dom.children("disks").unwrap().is_empty());
    assert!(dom.children("interfaces").unwrap().is_empty());
    assert_eq!(dom.render().unwrap(), "");
}

#[test]
fn reset_with_stub_keeps_the_root() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    dom.reset(true).unwrap();
    assert_eq!(dom.render().unwrap(), "<domain/>\n");
}

#[test]
fn reset_of_built_instance_unsets_staged_values() {
    let registry = registry();
    let mut gfx = Instance::<Graphics>::new_in(&registry).unwrap();
    gfx.set("listen", "0.0.0.0").unwrap();
    gfx.reset(true).unwrap();
    assert_eq!(gfx.get("listen").unwrap(), Value::Null);
    assert!(gfx.is_set("listen"));
    assert_eq!(gfx.get("kind").unwrap(), Value::from("vnc"));
    assert_eq!(gfx.render().unwrap(), "<graphics type=\"vnc\" keymap=\"en-us\"/>\n");
}

fn disk_summary(dom: &Instance<Domain>) -> Vec<(Value, Value)> {
    dom.children("disks")
        .unwrap()
        .iter()
        .map(|d| (d.get("kind").unwrap(), d.get("path").unwrap()))
        .collect()
}

#[test]
fn built_and_parsed_siblings_under_parsed_parent() {
    let registry = registry();
    let mut dom = Instance::<Domain>::parse_in(&registry, GUEST).unwrap();
    let built = dom.add_new("disks").unwrap();
    built.set("kind", "file").unwrap();
    built.set("path", "/a.img").unwrap();

    let parsed = Instance::<Disk>::parse_in(
        &registry,
        "<disk type='network'><source file='/b.img'/></disk>",
    )
    .unwrap();
    let parsed = dom.attach(parsed).unwrap();
    assert_eq!(parsed.xml_id(), "./devices/disk[4]");
    assert_eq!(parsed.get("kind").unwrap(), Value::from("network"));
    assert_eq!(parsed.get("path").unwrap(), Value::from("/b.img"));

    let reparsed = Instance::<Domain>::parse_in(&registry, &dom.render().unwrap()).unwrap();
    assert_eq!(
        disk_summary(&reparsed),
        vec![
            (Value::from("file"), Value::from("/var/lib/a.img")),
            (Value::from("block"), Value::Null),
            (Value::from("file"), Value::from("/a.img")),
            (Value::from("network"), Value::from("/b.img")),
        ]
    );
}

#[test]
fn built_and_parsed_siblings_under_built_parent() {
    let registry = registry();
    let mut dom = Instance::<Domain>::new_in(&registry).unwrap();
    dom.add_new("disks").unwrap().set("kind", "file").unwrap();

    let parsed = Instance::<Disk>::parse_in(&registry, "<disk type='network'/>").unwrap();
    assert!(!parsed.is_build());
    assert!(parsed.owns_document());
    let parsed = dom.attach(parsed).unwrap();
    assert!(parsed.is_build());
    assert!(!parsed.owns_document());
    assert_eq!(parsed.xml_id(), "./devices/disk[2]");
    assert_eq!(parsed.get("kind").unwrap(), Value::from("network"));

    let xml = dom.render().unwrap();
    assert_eq!(
        xml,
        r#"<domain type="kvm">
  <vcpu>1</vcpu>
  <devices>
    <disk type="file" device="disk"/>
    <disk type="network" device="disk"/>
  </devices>
</domain>
"#
    );
    let reparsed = Instance::<Domain>::parse_in(&registry, &xml).unwrap();
    let kinds: Vec<_> = disk_summary(&reparsed).into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![Value::from("file"), Value::from("network")]);
}

#[test]
fn parsed_child_keeps_its_values_under_built_parent() {
    let registry = registry();
    let mut dom = Instance::<Domain>::new_in(&registry).unwrap();
    dom.set("name", "vm").unwrap();
    let parsed = Instance::<Disk>::parse_in(
        &registry,
        "<disk type='block' device='cdrom'><source file='/iso/x.iso'/><readonly/></disk>",
    )
    .unwrap();
    let disk = dom.attach(parsed).unwrap();
    assert_eq!(disk.get("readonly").unwrap(), Value::Bool(true));
    assert_eq!(disk.get("shareable").unwrap(), Value::Bool(false));
    assert!(!disk.is_set("shareable"));

    let xml = dom.render().unwrap();
    let reparsed = Instance::<Domain>::parse_in(&registry, &xml).unwrap();
    let disk = &reparsed.children("disks").unwrap()[0];
    assert_eq!(disk.get("kind").unwrap(), Value::from("block"));
    assert_eq!(disk.get("device").unwrap(), Value::from("cdrom"));
    assert_eq!(disk.get("path").unwrap(), Value::from("/iso/x.iso"));
    assert_eq!(disk.get("readonly").unwrap(), Value::Bool(true));
    assert_eq!(reparsed.render().unwrap(), xml);
}
