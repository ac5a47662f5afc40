//! Chain executor: runs an ordered list of steps over a threaded value.
//!
//! Step `i` receives the output of step `i - 1` (step 0 receives the initial
//! value) together with the same configuration and version label. The first
//! failing step ends the chain; nothing after it runs.

use crate::error::CoreError;
use crate::step::Step;
use crate::value::{Mapping, Value};

/// Immutable description of one run.
#[derive(Debug, Clone)]
pub struct RunDescriptor {
    initial: Value,
    config: Mapping,
    version: String,
    steps: Vec<Step>,
}

impl RunDescriptor {
    pub fn new(initial: Value, config: Mapping, version: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            initial,
            config,
            version: version.into(),
            steps,
        }
    }

    pub fn initial(&self) -> &Value {
        &self.initial
    }

    pub fn config(&self) -> &Mapping {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    /// Iterate the chain lazily.
    pub fn chain(&self) -> Chain<'_> {
        Chain::new(&self.initial, &self.config, &self.version, &self.steps)
    }
}

/// One executed step: its position, identity, input and output.
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord {
    pub index: usize,
    pub step: String,
    pub input: Value,
    pub output: Value,
}

/// Result of a complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Output of the last step.
    pub output: Value,
    pub stages: Vec<StageRecord>,
}

/// Lazy, fail-fast iterator over the stages of a chain.
///
/// Yields one [`StageRecord`] per step. After a step error it yields that
/// error once and then stops.
pub struct Chain<'a> {
    config: &'a Mapping,
    version: &'a str,
    steps: std::slice::Iter<'a, Step>,
    index: usize,
    current: Option<Value>,
}

impl<'a> Chain<'a> {
    pub fn new(initial: &Value, config: &'a Mapping, version: &'a str, steps: &'a [Step]) -> Self {
        Self {
            config,
            version,
            steps: steps.iter(),
            index: 0,
            current: Some(initial.clone()),
        }
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = Result<StageRecord, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let input = self.current.take()?;
        let step = self.steps.next()?;
        let index = self.index;
        self.index += 1;

        match step.apply(&input, self.config, self.version) {
            Ok(output) => {
                tracing::debug!(index, step = step.name(), "stage executed");
                self.current = Some(output.clone());
                Some(Ok(StageRecord {
                    index,
                    step: step.name().to_string(),
                    input,
                    output,
                }))
            }
            Err(source) => {
                tracing::debug!(index, step = step.name(), error = %source, "stage failed");
                Some(Err(CoreError::StepExecution {
                    index,
                    step: step.name().to_string(),
                    source,
                }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.current.is_none() {
            (0, Some(0))
        } else {
            (0, Some(self.steps.len()))
        }
    }
}

/// Run every step of the descriptor in order.
pub fn execute(run: &RunDescriptor) -> Result<Execution, CoreError> {
    execute_steps(&run.initial, &run.config, &run.version, &run.steps)
}

/// Run `steps` over `initial` without building a descriptor.
pub fn execute_steps(
    initial: &Value,
    config: &Mapping,
    version: &str,
    steps: &[Step],
) -> Result<Execution, CoreError> {
    let stages = Chain::new(initial, config, version, steps).collect::<Result<Vec<_>, _>>()?;
    let output = stages
        .last()
        .map(|s| s.output.clone())
        .unwrap_or_else(|| initial.clone());
    Ok(Execution { output, stages })
}
