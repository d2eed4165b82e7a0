//! Static stage registry.
//!
//! Grounded in `original_source/app/pipeline/node_registry.py`'s
//! `NODE_FUNCTIONS` map: a name → constructor table built once and consulted
//! when compiling a declarative stage list into an executable sequence.
//! Enabling an unregistered stage name in configuration is a `ConfigError`
//! at compile time (`PipelineError::UnknownStage`), never a runtime panic.

use crate::stage::Stage;
use std::collections::HashMap;

/// Constructs a fresh, boxed stage instance. Factories are plain function
/// pointers (no captured state) so the registry stays `'static` and cheap to
/// clone.
pub type StageFactory = fn() -> Box<dyn Stage>;

/// Name → constructor table for every stage the binary knows how to run.
#[derive(Default)]
pub struct StageRegistry {
    factories: HashMap<&'static str, StageFactory>,
}

impl StageRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a stage constructor under `name`. Re-registering the same
    /// name overwrites the previous entry.
    pub fn register(&mut self, name: &'static str, factory: StageFactory) {
        self.factories.insert(name, factory);
    }

    /// True if `name` has a registered constructor.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Construct a fresh stage instance by name.
    pub fn build(&self, name: &str) -> Option<Box<dyn Stage>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// All registered stage names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &&'static str> {
        self.factories.keys()
    }
}

/// Register a stage constructor into a [`StageRegistry`] by name.
///
/// ```ignore
/// register_stage!(registry, "vector_search", || Box::new(VectorSearchStage::default()));
/// ```
#[macro_export]
macro_rules! register_stage {
    ($registry:expr, $name:expr, $factory:expr) => {
        $registry.register($name, $factory)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use async_trait::async_trait;
    use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};

    struct NoopStage;

    #[async_trait]
    impl Stage for NoopStage {
        fn name(&self) -> &'static str {
            "noop"
        }
        fn contract(&self) -> StageContract {
            StageContract::default()
        }
        async fn execute(&self, _state: &RunState) -> Result<PartialRunState, CoreError> {
            Ok(PartialRunState::default())
        }
    }

    #[test]
    fn register_and_build_round_trips() {
        let mut registry = StageRegistry::new();
        register_stage!(registry, "noop", || Box::new(NoopStage));
        assert!(registry.contains("noop"));
        assert!(registry.build("noop").is_some());
        assert!(registry.build("missing").is_none());
    }
}
