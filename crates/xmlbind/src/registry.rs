//! The descriptor cache.
//!
//! Schema tables are built the first time a type is used and shared from
//! then on. Building is deterministic, so when two threads race on the same
//! type the first insert wins and the other result is dropped.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::adapter::{tree_factory, DocumentAdapter, DocumentFactory};
use crate::config::Config;
use crate::error::{DocumentError, Result};
use crate::observer::{Access, PropertyObserver};
use crate::schema::{Schema, SchemaInfo};

pub struct Registry {
    config: Config,
    factory: DocumentFactory,
    observer: Option<Arc<dyn PropertyObserver>>,
    cache: RwLock<HashMap<TypeId, Arc<SchemaInfo>>>,
}

impl Registry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            factory: tree_factory,
            observer: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide registry built from [`Config::default`].
    pub fn global() -> Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Registry::default())).clone()
    }

    /// Use another document backend for parsed content.
    pub fn with_factory(mut self, factory: DocumentFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PropertyObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Descriptor table for `S`, building and caching it on first use.
    ///
    /// Declaration problems surface here as [`Error::Config`](crate::Error::Config)
    /// and nothing is cached for the type.
    pub fn schema<S: Schema>(&self) -> Result<Arc<SchemaInfo>> {
        let key = TypeId::of::<S>();
        if let Some(info) = self.read_cache().get(&key) {
            return Ok(info.clone());
        }
        let info = Arc::new(SchemaInfo::build::<S>()?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(key).or_insert(info).clone())
    }

    /// Every table cached so far.
    pub fn schemas(&self) -> Vec<Arc<SchemaInfo>> {
        self.read_cache().values().cloned().collect()
    }

    pub(crate) fn parse_document(
        &self,
        content: &str,
    ) -> Result<Box<dyn DocumentAdapter>, DocumentError> {
        (self.factory)(content)
    }

    pub(crate) fn observe(&self, schema: &'static str, field: &'static str, access: Access) {
        if let Some(observer) = &self.observer {
            observer.on_access(schema, field, access);
        }
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, Arc<SchemaInfo>>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("observer", &self.observer)
            .field("cached", &self.read_cache().len())
            .finish()
    }
}
