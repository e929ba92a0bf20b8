/*!
 * Process Class Registry
 * Binds durable class names to the factories that rebuild live processes
 */

use super::core::types::ProcessRecord;
use super::traits::{Process, ProcessFactory};
use super::validation::validate_class_name;
use crate::core::data_structures::InlineString;
use crate::core::errors::{ProcessError, ProcessResult};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

static GLOBAL_REGISTRY: OnceLock<ProcessRegistry> = OnceLock::new();

/// Append-only class-name → factory table
///
/// Persisted records carry only a class name; this table is the single
/// source of truth for turning that name back into behavior. Cloning the
/// handle shares the table.
#[derive(Clone, Default)]
pub struct ProcessRegistry {
    factories: Arc<RwLock<AHashMap<InlineString, Arc<ProcessFactory>>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry domain modules register into at startup
    pub fn global() -> &'static ProcessRegistry {
        GLOBAL_REGISTRY.get_or_init(ProcessRegistry::new)
    }

    /// Bind `name` to `factory`
    ///
    /// A name can be bound once. A second registration is logged and
    /// rejected with [`ProcessError::DuplicateClass`]; the first binding stays.
    pub fn register<F>(&self, name: &str, factory: F) -> ProcessResult<()>
    where
        F: Fn(&ProcessRecord) -> Box<dyn Process> + Send + Sync + 'static,
    {
        validate_class_name(name)?;

        let mut factories = self.factories.write();
        if factories.contains_key(name) {
            warn!(class = name, "duplicate process class registration ignored");
            return Err(ProcessError::DuplicateClass(name.into()));
        }
        factories.insert(InlineString::from(name), Arc::new(factory));
        debug!(class = name, "process class registered");
        Ok(())
    }

    /// Bind `name` to `T::default()`
    pub fn register_default<T>(&self, name: &str) -> ProcessResult<()>
    where
        T: Process + Default + 'static,
    {
        self.register(name, |_record: &ProcessRecord| -> Box<dyn Process> {
            Box::new(T::default())
        })
    }

    /// Factory bound to `name`, if any
    pub fn resolve(&self, name: &str) -> Option<Arc<ProcessFactory>> {
        self.factories.read().get(name).cloned()
    }

    /// Build the live behavior for `record`, or `None` if its class is unknown
    pub(crate) fn instantiate(&self, record: &ProcessRecord) -> Option<Box<dyn Process>> {
        let factory = self.resolve(record.class_name.as_str())?;
        Some(factory(record))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }

    /// Registered class names in sorted order
    pub fn class_names(&self) -> Vec<InlineString> {
        let mut names: Vec<InlineString> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("classes", &self.class_names())
            .finish()
    }
}

/// Register a process class in the process-wide registry
pub fn register_process_class<F>(name: &str, factory: F) -> ProcessResult<()>
where
    F: Fn(&ProcessRecord) -> Box<dyn Process> + Send + Sync + 'static,
{
    ProcessRegistry::global().register(name, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessMemory, RunContext};

    #[derive(Default)]
    struct Idle;

    impl Process for Idle {
        fn run(&mut self, _ctx: &mut RunContext<'_>, _memory: &mut ProcessMemory) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = ProcessRegistry::new();
        registry.register_default::<Idle>("idle").unwrap();

        assert!(registry.contains("idle"));
        assert!(registry.resolve("idle").is_some());
        assert!(registry.resolve("busy").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let registry = ProcessRegistry::new();
        registry.register_default::<Idle>("idle").unwrap();

        let err = registry.register_default::<Idle>("idle").unwrap_err();
        assert_eq!(err, ProcessError::DuplicateClass("idle".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_name_rejected() {
        let registry = ProcessRegistry::new();
        assert!(matches!(
            registry.register_default::<Idle>(""),
            Err(ProcessError::InvalidClassName(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clones_share_table() {
        let registry = ProcessRegistry::new();
        let handle = registry.clone();
        handle.register_default::<Idle>("idle").unwrap();
        assert!(registry.contains("idle"));
    }

    #[test]
    fn test_class_names_sorted() {
        let registry = ProcessRegistry::new();
        registry.register_default::<Idle>("zeta").unwrap();
        registry.register_default::<Idle>("alpha").unwrap();
        assert_eq!(registry.class_names(), vec![InlineString::from("alpha"), InlineString::from("zeta")]);
    }

    #[test]
    fn test_instantiate_unknown_class() {
        let registry = ProcessRegistry::new();
        let record = ProcessRecord::new(1, "ghost", 0, None, 0);
        assert!(registry.instantiate(&record).is_none());
    }
}
