//! Built-in link evaluators.

mod affine;
mod enum_map;
mod id;
mod normalized;
mod selection;

pub use affine::AffineEvaluator;
pub use enum_map::EnumMapEvaluator;
pub use id::IdEvaluator;
pub use normalized::IdNormalizedEvaluator;
pub use selection::SelectionEvaluator;

use crate::link::evaluator::LinkEvaluator;

/// Prototypes of all built-in evaluators, `id` first.
pub fn builtin() -> Vec<Box<dyn LinkEvaluator>> {
    vec![
        Box::new(IdEvaluator),
        Box::new(IdNormalizedEvaluator),
        Box::new(AffineEvaluator::default()),
        Box::new(EnumMapEvaluator::default()),
        Box::new(SelectionEvaluator),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::property::Property;
    use crate::core::types::{Interval, SelectionEntry, Value};
    use crate::link::evaluator::LinkInput;
    use proptest::prelude::*;

    fn arb_property() -> BoxedStrategy<Property> {
        prop_oneof![
            any::<bool>().prop_map(|b| Property::bool("p", "P", b)),
            (-100i64..100, -100i64..0, 0i64..100)
                .prop_map(|(v, lo, hi)| Property::int("p", "P", v, lo, hi)),
            (-1e3f64..1e3, -1e3f64..0.0, 0.0f64..1e3)
                .prop_map(|(v, lo, hi)| Property::float("p", "P", v, lo, hi)),
            (-1e3f64..1e3).prop_map(|v| Property::new("p", "P", Value::Float(v))),
            "[a-z0-9.]{0,6}".prop_map(|s| Property::string("p", "P", s)),
            prop::array::uniform2(-50i64..50)
                .prop_map(|v| Property::new("p", "P", Value::IntVec2(v))),
            prop::array::uniform3(-50.0f64..50.0).prop_map(|v| {
                Property::new("p", "P", Value::FloatVec3(v))
                    .with_bounds(Value::FloatVec3([-50.0; 3]), Value::FloatVec3([50.0; 3]))
            }),
            prop::array::uniform4(-50i64..50).prop_map(|v| {
                Property::new("p", "P", Value::IntVec4(v))
                    .with_bounds(Value::IntVec4([-50; 4]), Value::IntVec4([50; 4]))
            }),
            (0usize..5).prop_map(|i| match i {
                0..=2 => {
                    let keys = ["a", "b", "c"];
                    Property::option("p", "P", &[("a", "A"), ("b", "B"), ("c", "C")], keys[i])
                }
                3 => Property::option("p", "P", &[("b", "B"), ("x", "X")], "x"),
                _ => Property::file("p", "P", "/data/volume.dat"),
            }),
            (0.0f64..1.0, any::<bool>()).prop_map(|(lo, highlight)| {
                let mut entry = SelectionEntry::new(vec![Interval::new(lo, lo + 1.0)]);
                entry.highlight = highlight;
                Property::selection("p", "P", vec![entry])
            }),
        ]
        .boxed()
    }

    fn evaluators() -> Vec<Box<dyn LinkEvaluator>> {
        let mut all = builtin();
        all.push(Box::new(AffineEvaluator::new(10.0, 2.0)));
        all.push(Box::new(EnumMapEvaluator::default().map("a", "x")));
        all
    }

    proptest! {
        #[test]
        fn linkable_pairs_always_evaluate(source in arb_property(), destination in arb_property()) {
            for evaluator in evaluators() {
                if !evaluator.are_linkable(&source, &destination) {
                    continue;
                }
                let result = evaluator.eval(&LinkInput {
                    source: &source,
                    old_source: source.get(),
                    destination: &destination,
                });
                prop_assert!(result.is_ok(), "{} failed: {:?}", evaluator.class_name(), result);
                let value = result.unwrap();
                prop_assert!(
                    destination.validate(value.clone()).is_ok(),
                    "{} produced {:?} for {:?}",
                    evaluator.class_name(),
                    value,
                    destination
                );
            }
        }
    }

    #[test]
    fn test_builtin_class_names_unique() {
        let names: Vec<&str> = builtin().iter().map(|e| e.class_name()).collect();
        assert_eq!(names, vec!["id", "id_normalized", "affine", "enum_map", "selection"]);
    }

    #[test]
    fn test_unlinkable_eval_fails() {
        let number = Property::int("n", "N", 0, 0, 1);
        let path = Property::file("f", "F", "/tmp/a");
        let result = IdEvaluator.eval(&LinkInput {
            source: &number,
            old_source: number.get(),
            destination: &path,
        });
        assert!(result.is_err());
    }
}
