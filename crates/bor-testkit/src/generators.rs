//! Proptest generators for property-based testing.

use proptest::prelude::*;

use bor::{Mapping, Proof, Run, Value};

use crate::fixtures::{add_step, double_step, offset_config, square_step};

/// Generate a mapping key.
pub fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}".prop_map(String::from)
}

/// Generate a version label.
pub fn version() -> impl Strategy<Value = String> {
    "v[0-9]{1,2}\\.[0-9]{1,2}".prop_map(String::from)
}

/// Generate a finite float with a fractional part, so it never encodes as
/// an integer.
pub fn fractional_float() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL.prop_filter("fractional", |x| x.fract() != 0.0)
}

/// Generate a leaf value: integer, float, bool, or text.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        fractional_float().prop_map(Value::Float),
        any::<bool>().prop_map(Value::Bool),
        ".{0,16}".prop_map(Value::Text),
    ]
}

/// Generate a value tree without floats.
///
/// Distinct trees from this generator always have distinct canonical
/// encodings, so it is the one to use for injectivity properties.
pub fn exact_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        ".{0,16}".prop_map(Value::Text),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Seq),
            prop::collection::btree_map(key(), inner, 0..6).prop_map(Value::Map),
        ]
    })
}

/// Generate an arbitrary value tree.
pub fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Seq),
            prop::collection::btree_map(key(), inner, 0..6).prop_map(Value::Map),
        ]
    })
}

/// Generate a configuration mapping.
pub fn mapping() -> impl Strategy<Value = Mapping> {
    prop::collection::btree_map(key(), value(), 0..6)
}

/// Generate a non-empty chain of fixture step names.
pub fn step_names() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop_oneof![Just("add"), Just("double")], 1..6)
}

/// Parameters for generating a run.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub initial: i64,
    pub offset: i64,
    pub version: String,
    pub steps: Vec<&'static str>,
}

impl Arbitrary for RunParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            -1_000_000i64..1_000_000i64, // initial
            -1000i64..1000i64,           // offset
            version(),
            step_names(),
        )
            .prop_map(|(initial, offset, version, steps)| RunParams {
                initial,
                offset,
                version,
                steps,
            })
            .boxed()
    }
}

/// Build an unfinalized run from parameters.
///
/// Values stay small enough that `add` and `double` never overflow over
/// the generated chain lengths.
pub fn run_from_params(params: &RunParams) -> Run {
    let steps = params.steps.iter().map(|name| match *name {
        "add" => add_step(),
        "double" => double_step(),
        _ => square_step(),
    });
    Run::new(
        Value::Int(params.initial),
        offset_config(params.offset),
        params.version.clone(),
    )
    .add_steps(steps)
}

/// Finalize a run built from parameters.
pub fn proof_from_params(params: &RunParams) -> Proof {
    let mut run = run_from_params(params);
    run.finalize().expect("generated run finalizes").clone()
}
