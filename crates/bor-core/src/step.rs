//! Steps: named, pure functions over [`Value`].
//!
//! A step's identity is its name plus its behavior. The name is what a proof
//! records and what replay uses to find the function again, through an
//! explicit [`StepRegistry`] rather than any process-wide table.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{CoreError, StepFailure};
use crate::value::{Mapping, Value};

/// Signature of a step function.
pub type StepFn = dyn Fn(&Value, &Mapping, &str) -> Result<Value, StepFailure> + Send + Sync;

/// A named step.
///
/// Cloning shares the underlying function.
#[derive(Clone)]
pub struct Step {
    name: Arc<str>,
    func: Arc<StepFn>,
}

impl Step {
    /// Pair a stable name with a fallible step function.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Mapping, &str) -> Result<Value, StepFailure> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            func: Arc::new(func),
        }
    }

    /// Pair a stable name with an infallible step function.
    pub fn infallible<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Mapping, &str) -> Value + Send + Sync + 'static,
    {
        Self::new(name, move |x, c, v| Ok(func(x, c, v)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the step.
    pub fn apply(&self, input: &Value, config: &Mapping, version: &str) -> Result<Value, StepFailure> {
        (self.func)(input, config, version)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step({})", self.name)
    }
}

/// Explicit name → step mapping used to resolve recorded step names.
///
/// Names are unique; registering a name twice is an error rather than a
/// silent override.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: BTreeMap<String, Step>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step under its own name.
    pub fn register(&mut self, step: Step) -> Result<&mut Self, CoreError> {
        let name = step.name().to_string();
        if self.steps.contains_key(&name) {
            return Err(CoreError::DuplicateStep(name));
        }
        self.steps.insert(name, step);
        Ok(self)
    }

    /// Build a registry from a list of steps.
    pub fn from_steps(steps: impl IntoIterator<Item = Step>) -> Result<Self, CoreError> {
        let mut registry = Self::new();
        for step in steps {
            registry.register(step)?;
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Resolve an ordered list of names to steps.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Step>, CoreError> {
        names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .cloned()
                    .ok_or_else(|| CoreError::UnknownStep(name.as_ref().to_string()))
            })
            .collect()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
