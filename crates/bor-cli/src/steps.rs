//! Built-in steps available to `bor run` and `bor verify`.
//!
//! Integer inputs use checked arithmetic; any float operand switches the
//! step to float arithmetic. Overflow and non-numeric inputs are step
//! failures.

use bor::core::StepFailure;
use bor::{Mapping, Step, StepRegistry, Value};

/// Names of every built-in step, in registration order.
pub const BUILTIN: &[&str] = &["add", "square", "double", "negate", "increment", "identity"];

/// The registry of built-in steps.
pub fn registry() -> anyhow::Result<StepRegistry> {
    Ok(StepRegistry::from_steps([
        Step::new("add", add),
        Step::new("square", |x, _, _| binary("square", x, x, i64::checked_mul, |a, b| a * b)),
        Step::new("double", |x, _, _| {
            binary("double", x, &Value::Int(2), i64::checked_mul, |a, b| a * b)
        }),
        Step::new("negate", |x, _, _| {
            binary("negate", &Value::Int(0), x, i64::checked_sub, |a, b| a - b)
        }),
        Step::new("increment", |x, _, _| {
            binary("increment", x, &Value::Int(1), i64::checked_add, |a, b| a + b)
        }),
        Step::infallible("identity", |x, _, _| x.clone()),
    ])?)
}

fn add(x: &Value, config: &Mapping, _version: &str) -> Result<Value, StepFailure> {
    let offset = config.get("offset").cloned().unwrap_or(Value::Int(0));
    binary("add", x, &offset, i64::checked_add, |a, b| a + b)
}

fn binary(
    name: &str,
    a: &Value,
    b: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, StepFailure> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b)
            .map(Value::Int)
            .ok_or_else(|| format!("{name}: integer overflow").into()),
        _ => {
            let (x, y) = match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => (x, y),
                _ => {
                    let culprit = if a.is_number() { b } else { a };
                    return Err(format!("{name}: expected a number, got {}", culprit.type_name()).into());
                }
            };
            let result = float_op(x, y);
            if result.is_finite() {
                Ok(Value::Float(result))
            } else {
                Err(format!("{name}: non-finite result").into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(name: &str, x: Value, config: &Mapping) -> Result<Value, StepFailure> {
        registry().unwrap().get(name).unwrap().apply(&x, config, "v1")
    }

    fn offset(n: i64) -> Mapping {
        [("offset".to_string(), Value::Int(n))].into_iter().collect()
    }

    #[test]
    fn test_all_builtins_registered() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), BUILTIN.len());
        for name in BUILTIN {
            assert!(registry.contains(name), "{name} missing");
        }
    }

    #[test]
    fn test_integer_steps() {
        let none = Mapping::new();
        assert_eq!(apply("add", Value::Int(3), &offset(2)).unwrap(), Value::Int(5));
        assert_eq!(apply("add", Value::Int(3), &none).unwrap(), Value::Int(3));
        assert_eq!(apply("square", Value::Int(-5), &none).unwrap(), Value::Int(25));
        assert_eq!(apply("double", Value::Int(21), &none).unwrap(), Value::Int(42));
        assert_eq!(apply("negate", Value::Int(4), &none).unwrap(), Value::Int(-4));
        assert_eq!(apply("increment", Value::Int(9), &none).unwrap(), Value::Int(10));
        assert_eq!(apply("identity", Value::from("x"), &none).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_float_fallback() {
        let none = Mapping::new();
        assert_eq!(apply("add", Value::Float(1.5), &offset(2)).unwrap(), Value::Float(3.5));
        assert_eq!(apply("double", Value::Float(3.5), &none).unwrap(), Value::Float(7.0));
        assert_eq!(apply("negate", Value::Float(0.5), &none).unwrap(), Value::Float(-0.5));
    }

    #[test]
    fn test_failures() {
        let none = Mapping::new();
        assert!(apply("square", Value::Int(i64::MAX), &none).is_err());
        assert!(apply("negate", Value::Int(i64::MIN), &none).is_err());
        assert!(apply("increment", Value::from("x"), &none).is_err());
        assert!(apply("square", Value::Float(f64::MAX), &none).is_err());

        let bad: Mapping = [("offset".to_string(), Value::from("two"))].into_iter().collect();
        let err = apply("add", Value::Int(1), &bad).unwrap_err();
        assert!(err.to_string().contains("text"), "{err}");
    }
}
