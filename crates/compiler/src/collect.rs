//! Phase 2 of `Generate`: fixpoint collection of pending for-each outputs.
//!
//! Repeatedly scans `forEachOutputsToBeCollected`; any entry whose every
//! listed variable now has a value (literal or in `variableValues`) is
//! removed and its aggregated value published via [`flowc_util::yield_to`].
//! Runs to a fixpoint within one call so that a chain of collectors (one
//! for-each's output feeding another's) resolves in a single `Generate`
//! round, per the invariant that "yields that unblock other yields must be
//! observed in the same call."

use flowc_util::yield_to;

use crate::Compiler;

impl Compiler {
    pub(crate) fn collect_for_each_outputs(&mut self) {
        loop {
            let keys: Vec<String> = self.for_each_outputs_to_be_collected.keys().cloned().collect();
            let mut progressed = false;

            for key in keys {
                let ready = self.for_each_outputs_to_be_collected[&key]
                    .iter()
                    .all(|v| self.literal_value(v).is_some() || self.variable_values.contains_key(&v.id));
                if !ready {
                    continue;
                }

                let vars = self.for_each_outputs_to_be_collected.shift_remove(&key).expect("key observed above");
                let outputs: Vec<_> = vars
                    .iter()
                    .map(|v| self.literal_value(v).or_else(|| self.variable_values.get(&v.id).cloned()).expect("checked ready above"))
                    .collect();
                let dest = self.variable_values.get(&key).cloned();
                let collected = yield_to(dest.as_ref(), &outputs);
                tracing::debug!(variable_id = %key, count = outputs.len(), "collected for-each output");
                self.variable_values.insert(key, collected);
                progressed = true;
            }

            if !progressed {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use flowc_types::{ServiceMetadata, Variable, Workflow};
    use flowc_util::TimeSortableIdGenerator;
    use serde_json::json;

    use crate::{Compiler, oracle::NoOutputAdapters};

    fn empty_compiler() -> Compiler {
        Compiler::new(Workflow::default(), "/tmp", "/out", Vec::<ServiceMetadata>::new(), Box::new(NoOutputAdapters), Box::new(TimeSortableIdGenerator))
    }

    #[test]
    fn fixpoint_resolves_chained_collectors() {
        let mut compiler = empty_compiler();
        // outer$$ collects from [a, b]; a chain: "b" is itself collected from [c].
        compiler
            .for_each_outputs_to_be_collected
            .insert("outer".to_string(), vec![Variable::new("a"), Variable::new("b")]);
        compiler.for_each_outputs_to_be_collected.insert("b".to_string(), vec![Variable::new("c")]);
        compiler.variable_values.insert("a".to_string(), json!("va"));
        compiler.variable_values.insert("c".to_string(), json!("vc"));

        compiler.collect_for_each_outputs();

        assert!(compiler.for_each_outputs_to_be_collected.is_empty());
        assert_eq!(compiler.variable_values.get("b"), Some(&json!("vc")));
        assert_eq!(compiler.variable_values.get("outer"), Some(&json!(["va", "vc"])));
    }

    #[test]
    fn entries_with_unresolved_members_stay_pending() {
        let mut compiler = empty_compiler();
        compiler.for_each_outputs_to_be_collected.insert("outer".to_string(), vec![Variable::new("a"), Variable::new("missing")]);
        compiler.variable_values.insert("a".to_string(), json!("va"));

        compiler.collect_for_each_outputs();

        assert!(compiler.for_each_outputs_to_be_collected.contains_key("outer"));
        assert!(!compiler.variable_values.contains_key("outer"));
    }
}
