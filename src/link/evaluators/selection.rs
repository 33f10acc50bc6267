//! Plot selection evaluator.

use crate::core::error::LinkError;
use crate::core::property::Property;
use crate::core::types::{SelectionEntry, Value, ValueKind};
use crate::link::evaluator::{incompatible, LinkEvaluator, LinkInput};

/// Copies selection ranges while keeping the destination's display flags.
///
/// Entry `i` of the result has the ranges of source entry `i` and the
/// highlight/label/zoom flags of destination entry `i` (cleared when the
/// destination has fewer entries).
#[derive(Debug, Clone, Default)]
pub struct SelectionEvaluator;

impl LinkEvaluator for SelectionEvaluator {
    fn class_name(&self) -> &'static str {
        "selection"
    }

    fn display_name(&self) -> &'static str {
        "Plot Selection"
    }

    fn are_linkable(&self, source: &Property, destination: &Property) -> bool {
        source.kind() == ValueKind::Selection && destination.kind() == ValueKind::Selection
    }

    fn eval(&self, input: &LinkInput) -> Result<Value, LinkError> {
        let (Some(source), Some(target)) = (
            input.source.get().as_selection(),
            input.destination.get().as_selection(),
        ) else {
            return Err(incompatible(self, input));
        };

        let entries = source
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let flags = target.get(i).cloned().unwrap_or_default();
                SelectionEntry {
                    ranges: entry.ranges.clone(),
                    ..flags
                }
            })
            .collect();
        Ok(Value::Selection(entries))
    }

    fn create(&self) -> Box<dyn LinkEvaluator> {
        Box::new(SelectionEvaluator)
    }

    fn clone_box(&self) -> Box<dyn LinkEvaluator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Interval;

    #[test]
    fn test_ranges_copied_flags_kept() {
        let mut highlighted = SelectionEntry::new(vec![Interval::new(0.0, 1.0)]);
        highlighted.highlight = true;
        highlighted.zoom_to = true;

        let mut labeled = SelectionEntry::new(vec![Interval::new(5.0, 6.0)]);
        labeled.label = true;

        let source = Property::selection(
            "sel",
            "Selection",
            vec![
                SelectionEntry::new(vec![Interval::new(2.0, 3.0)]),
                labeled,
            ],
        );
        let destination = Property::selection("sel", "Selection", vec![highlighted]);

        let result = SelectionEvaluator
            .eval(&LinkInput {
                source: &source,
                old_source: source.get(),
                destination: &destination,
            })
            .unwrap();
        let entries = result.as_selection().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ranges, vec![Interval::new(2.0, 3.0)]);
        assert!(entries[0].highlight && entries[0].zoom_to);
        // Destination had no second entry, flags start cleared
        assert_eq!(entries[1].ranges, vec![Interval::new(5.0, 6.0)]);
        assert!(!entries[1].label);
    }
}
