#![allow(dead_code)]

use std::sync::Arc;

use xmlbind::{ChildProperty, Declaration, Node, Property, Registry, Schema, Value};

pub fn registry() -> Arc<Registry> {
    Arc::new(Registry::default())
}

/// Fields shared by every device.
pub struct DeviceBase;

impl Schema for DeviceBase {
    const ROOT_NAME: &'static str = "device";

    fn declare(decl: &mut Declaration) {
        decl.property("alias", Property::new("./alias/@name"))
            .property("kind", Property::new("./@kind"));
    }
}

pub struct Disk;

impl Schema for Disk {
    const ROOT_NAME: &'static str = "disk";
    const PROP_ORDER: &'static [&'static str] = &["kind", "device", "driver_name", "path", "readonly"];

    fn declare(decl: &mut Declaration) {
        decl.extend::<DeviceBase>()
            .property(
                "kind",
                Property::new("./@type").validate_with(|_, value| match value {
                    Value::Null => Ok(()),
                    Value::Text(t) if ["file", "block", "network"].contains(&t.as_str()) => Ok(()),
                    other => Err(format!("unsupported disk type {other}")),
                }),
            )
            .property("device", Property::new("./@device").default_value("disk"))
            .property("driver_name", Property::new("./driver/@name"))
            .property("path", Property::new("./source/@file").abspath())
            .property("readonly", Property::new("./readonly").presence())
            .property("shareable", Property::new("./shareable").presence());
    }
}

pub struct Interface;

impl Schema for Interface {
    const ROOT_NAME: &'static str = "interface";

    fn declare(decl: &mut Declaration) {
        decl.extend::<DeviceBase>()
            .property("kind", Property::new("./@type"))
            .property("mac", Property::new("./mac/@address"))
            .property("link_up", Property::new("./link/@state").on_off())
            .property("trust", Property::new("./@trustGuestRxFilters").yes_no())
            .property("boot_order", Property::new("./boot/@order").int());
    }
}

pub struct Cpu;

impl Schema for Cpu {
    const ROOT_NAME: &'static str = "cpu";
    const PROP_ORDER: &'static [&'static str] = &["mode", "model"];

    fn declare(decl: &mut Declaration) {
        decl.property("mode", Property::new("./@mode"))
            .property("model", Property::new("./model"));
    }
}

pub struct Domain;

impl Schema for Domain {
    const ROOT_NAME: &'static str = "domain";
    const PROP_ORDER: &'static [&'static str] = &["kind", "name", "memory", "vcpus", "acpi", "cpu"];

    fn declare(decl: &mut Declaration) {
        decl.property("kind", Property::new("./@type").default_value("kvm"))
            .property("name", Property::new("./name"))
            .property("memory", Property::new("./memory").int())
            .property("vcpus", Property::new("./vcpu").int().default_value(1))
            .property("acpi", Property::new("./features/acpi").presence())
            .property("description", Property::new("./description"))
            .child("cpu", ChildProperty::single::<Cpu>("."))
            .child("disks", ChildProperty::many::<Disk>("./devices"))
            .child("interfaces", ChildProperty::many::<Interface>("./devices"));
    }

    fn validate(node: &Node) -> xmlbind::Result<()> {
        if node.get("name")?.is_null() {
            return Err(xmlbind::Error::Validation {
                field: "name".into(),
                reason: "a domain needs a name".into(),
            });
        }
        Ok(())
    }
}

pub struct Graphics;

impl Schema for Graphics {
    const ROOT_NAME: &'static str = "graphics";

    fn declare(decl: &mut Declaration) {
        decl.property("kind", Property::new("./@type").default_value("vnc"))
            .property(
                "keymap",
                Property::new("./@keymap")
                    .default_with(|_| Value::from("en-us"))
                    .default_name("default"),
            )
            .property(
                "listen",
                Property::new("./@listen").convert(|_, value| {
                    Ok(match value {
                        Value::Text(text) => Value::Text(text.to_lowercase()),
                        other => other,
                    })
                }),
            );
    }
}

pub struct QemuArg;

impl Schema for QemuArg {
    const ROOT_NAME: &'static str = "qemu:arg";

    fn declare(decl: &mut Declaration) {
        decl.property("value", Property::new("./@value"));
    }
}

pub struct QemuCommandline;

impl Schema for QemuCommandline {
    const ROOT_NAME: &'static str = "qemu:commandline";

    fn declare(decl: &mut Declaration) {
        decl.child("args", ChildProperty::many::<QemuArg>("."));
    }
}

pub struct NodeDevice;

impl Schema for NodeDevice {
    const ROOT_NAME: &'static str = "device";
    const SANITIZE: bool = true;

    fn declare(decl: &mut Declaration) {
        decl.property("name", Property::new("./name"));
    }
}

pub const GUEST: &str = r#"<domain type="kvm">
  <name>guest</name>
  <!-- keep me -->
  <memory>0x100000</memory>
  <features>
    <acpi/>
  </features>
  <devices>
    <disk type="file" device="disk">
      <source file="/var/lib/a.img"/>
    </disk>
    <interface type="network" trustGuestRxFilters="yes">
      <mac address="52:54:00:aa:bb:cc"/>
      <link state="off"/>
      <boot order="0x10"/>
    </interface>
    <disk type="block" device="cdrom"/>
  </devices>
</domain>
"#;
