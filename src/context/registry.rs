//! A closure-backed `EvaluatorRegistry` (§10.5): maps each transform to an
//! [`EvaluatorFactory`] supplied by the embedder at graph construction time.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::traits::{EvaluatorFactory, EvaluatorRegistry, RegistryError, TransformEvaluator};
use crate::bundle::Bundle;
use crate::util::TransformId;

/// Static registry built once from a fixed `(TransformId -> EvaluatorFactory)`
/// map; never mutated after construction (§10.5).
pub struct StaticEvaluatorRegistry {
    factories: HashMap<TransformId, Box<dyn EvaluatorFactory>>,
}

impl StaticEvaluatorRegistry {
    /// Start building a registry.
    pub fn builder() -> StaticEvaluatorRegistryBuilder {
        StaticEvaluatorRegistryBuilder::default()
    }
}

impl EvaluatorRegistry for StaticEvaluatorRegistry {
    fn evaluator_for(
        &self,
        transform: TransformId,
        _input_bundle: Option<&Bundle>,
    ) -> Result<Box<dyn TransformEvaluator>, RegistryError> {
        self.factories
            .get(&transform)
            .map(|factory| factory.create())
            .ok_or(RegistryError::NotFound(transform))
    }
}

/// Builder for [`StaticEvaluatorRegistry`].
#[derive(Default)]
pub struct StaticEvaluatorRegistryBuilder {
    factories: HashMap<TransformId, Box<dyn EvaluatorFactory>>,
}

impl StaticEvaluatorRegistryBuilder {
    /// Register a factory for `transform`. A closure of type
    /// `Fn() -> Box<dyn TransformEvaluator>` satisfies [`EvaluatorFactory`]
    /// via its blanket impl.
    pub fn with_factory(
        mut self,
        transform: TransformId,
        factory: impl EvaluatorFactory + 'static,
    ) -> Self {
        self.factories.insert(transform, Box::new(factory));
        self
    }

    /// Finalize into a [`StaticEvaluatorRegistry`].
    pub fn build(self) -> StaticEvaluatorRegistry {
        StaticEvaluatorRegistry {
            factories: self.factories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::traits::TransformResult;
    use crate::error::EvaluatorError;

    struct NoopEvaluator;

    impl TransformEvaluator for NoopEvaluator {
        fn start(&mut self, _input_bundle: Option<&Bundle>) -> Result<(), EvaluatorError> {
            Ok(())
        }

        fn process_element(
            &mut self,
            _value: &crate::bundle::WindowedValue,
            _key: Option<&crate::bundle::Key>,
        ) -> Result<(), EvaluatorError> {
            Ok(())
        }

        fn finish(&mut self) -> Result<TransformResult, EvaluatorError> {
            Ok(TransformResult::empty())
        }
    }

    #[test]
    fn test_resolves_registered_transform() {
        let transform = TransformId::new();
        let registry = StaticEvaluatorRegistry::builder()
            .with_factory(transform, || -> Box<dyn TransformEvaluator> {
                Box::new(NoopEvaluator)
            })
            .build();

        assert!(registry.evaluator_for(transform, None).is_ok());
    }

    #[test]
    fn test_unregistered_transform_errors() {
        let registry = StaticEvaluatorRegistry::builder().build();
        let transform = TransformId::new();
        let err = registry.evaluator_for(transform, None).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(t) if t == transform));
    }
}
