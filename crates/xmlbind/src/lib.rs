//! xmlbind: declarative binding between typed objects and a path-addressed
//! document.
//!
//! A type implements [`Schema`] to declare its fields: scalar
//! [`Property`]s bound to paths relative to the type's own node, and
//! [`ChildProperty`]s holding nested instances. An [`Instance`] of the type
//! is either built from scratch or parsed from existing content:
//!
//! - reads are lazy and come from the document until a field is set
//! - writes are staged and reach the document when the instance renders
//! - rendering writes fields in a declared order and keeps everything the
//!   schema does not know about
//!
//! ```
//! use xmlbind::{ChildProperty, Declaration, Instance, Property, Schema, Value};
//!
//! struct Disk;
//! impl Schema for Disk {
//!     const ROOT_NAME: &'static str = "disk";
//!     const PROP_ORDER: &'static [&'static str] = &["kind", "device"];
//!     fn declare(decl: &mut Declaration) {
//!         decl.property("kind", Property::new("./@type"))
//!             .property("device", Property::new("./@device").default_value("disk"))
//!             .property("path", Property::new("./source/@file"));
//!     }
//! }
//!
//! struct Domain;
//! impl Schema for Domain {
//!     const ROOT_NAME: &'static str = "domain";
//!     fn declare(decl: &mut Declaration) {
//!         decl.property("name", Property::new("./name"))
//!             .child("disks", ChildProperty::many::<Disk>("./devices"));
//!     }
//! }
//!
//! let mut dom = Instance::<Domain>::parse("<domain><name>vm1</name></domain>").unwrap();
//! assert_eq!(dom.get("name").unwrap(), Value::from("vm1"));
//!
//! let disk = dom.add_new("disks").unwrap();
//! disk.set("kind", "file").unwrap();
//! disk.set("path", "/var/lib/vm1.img").unwrap();
//!
//! assert_eq!(
//!     dom.render().unwrap(),
//!     "<domain>
//!   <name>vm1</name>
//!   <devices>
//!     <disk type=\"file\" device=\"disk\">
//!       <source file=\"/var/lib/vm1.img\"/>
//!     </disk>
//!   </devices>
//! </domain>
//! "
//! );
//! ```

pub mod error;
pub use error::{DocumentError, Error, Result};

pub mod value;
pub use value::Value;

pub mod adapter;
pub use adapter::{tree_factory, DocumentAdapter, DocumentFactory};

pub mod config;
pub use config::{Config, Namespaces};

pub mod observer;
pub use observer::{Access, PropertyObserver, TrackingObserver};

pub mod property;
pub use property::{Conversion, Property};

pub mod child;
pub use child::{ChildProperty, ChildTarget};

pub mod schema;
pub use schema::{Declaration, Field, Schema, SchemaInfo};

pub mod registry;
pub use registry::Registry;

pub mod state;
pub use state::{DocHandle, InstanceState};

pub mod node;
pub use node::{Children, Node, PropertyStore};

pub mod instance;
pub use instance::Instance;

pub use xmlbind_path::XPath;
