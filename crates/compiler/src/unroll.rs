//! Phase 3 of `Generate`: breadth-first for-each unrolling.
//!
//! See the module-level design note in `SPEC_FULL.md` §4.1 for the full
//! algorithm; this module is a direct realization of it.

use std::collections::VecDeque;

use flowc_types::{Action, ActionId, ExecuteAction, ForEachAction, Parameter, Variable, value::to_sequence};

use crate::{Compiler, error::CompileError};

/// Outcome of attempting to unroll one pending `ForEachAction` this round.
enum UnrollStep {
    /// The input isn't resolvable yet; leave the action untouched.
    Skip,
    /// Unrolling produced these new pending actions (already flattened into
    /// siblings); `retire` says whether the original for-each should be
    /// removed from the pending set.
    Unrolled { new_actions: Vec<Action>, retire: bool },
}

impl Compiler {
    pub(crate) fn unroll_for_each(&mut self) -> Result<(), CompileError> {
        let mut queue: VecDeque<ActionId> =
            self.actions.iter().filter_map(|a| if let Action::ForEach(fe) = a { Some(fe.action_id) } else { None }).collect();

        while let Some(id) = queue.pop_front() {
            let Some(pos) = self.actions.iter().position(|a| a.action_id() == id) else {
                continue;
            };
            let fe = match &self.actions[pos] {
                Action::ForEach(fe) => fe.clone(),
                Action::Execute(_) => continue,
            };

            match self.try_unroll(&fe)? {
                UnrollStep::Skip => {}
                UnrollStep::Unrolled { new_actions, retire } => {
                    if retire {
                        self.actions.remove(pos);
                    }
                    for action in &new_actions {
                        if let Action::ForEach(nested) = action {
                            queue.push_back(nested.action_id);
                        }
                    }
                    tracing::debug!(for_each = ?fe.action_id, produced = new_actions.len(), retired = retire, "unrolled for-each");
                    self.actions.extend(new_actions);
                }
            }
        }
        Ok(())
    }

    fn try_unroll(&mut self, fe: &ForEachAction) -> Result<UnrollStep, CompileError> {
        let recursive_key = recursive_input_id(&fe.input.id, &fe.enumerator.id);

        let resolved = self
            .variable_values
            .get(&recursive_key)
            .cloned()
            .or_else(|| self.variable_values.get(&fe.input.id).cloned())
            .or_else(|| self.literal_value(&fe.input));

        let Some(resolved) = resolved else {
            return Ok(UnrollStep::Skip);
        };

        let items = to_sequence(&resolved);
        let mut new_actions = Vec::new();
        let mut yielded_to_output = Vec::new();
        let mut yielded_to_input = Vec::new();

        for item in items {
            let iteration = self.next_iteration(&fe.enumerator.id);
            let enum_var = Variable { id: format!("{}${iteration}", fe.enumerator.id), value: Some(item) };

            let mut subst = std::collections::HashMap::new();
            subst.insert(fe.enumerator.id.clone(), enum_var);

            for body_action in &fe.actions {
                new_actions.push(deep_copy_with_subst(body_action, iteration, &mut subst));
            }

            if let Some(yto) = &fe.yield_to_output {
                let resolved_var = subst
                    .get(&yto.id)
                    .cloned()
                    .ok_or_else(|| CompileError::InvalidWorkflow(format!("yieldToOutput variable `{}` not produced by for-each body", yto.id)))?;
                yielded_to_output.push(resolved_var);
            }
            if let Some(yti) = &fe.yield_to_input {
                let resolved_var = subst
                    .get(&yti.id)
                    .cloned()
                    .ok_or_else(|| CompileError::InvalidWorkflow(format!("yieldToInput variable `{}` not produced by for-each body", yti.id)))?;
                yielded_to_input.push(resolved_var);
            }
        }

        if let Some(output) = &fe.output
            && !yielded_to_output.is_empty()
        {
            let pending_key = pending_output_id(&output.id);
            self.for_each_outputs_to_be_collected.entry(pending_key).or_default().extend(yielded_to_output);
        }

        let retire = if fe.yield_to_input.is_some() {
            if yielded_to_input.is_empty() {
                !self.for_each_outputs_to_be_collected.contains_key(&recursive_key)
            } else {
                self.variable_values.insert(recursive_key.clone(), flowc_types::Value::Array(Vec::new()));
                self.for_each_outputs_to_be_collected.entry(recursive_key.clone()).or_default().extend(yielded_to_input);
                false
            }
        } else {
            true
        };

        if retire {
            self.retire_output_collector(fe);
        }

        Ok(UnrollStep::Unrolled { new_actions, retire })
    }

    /// Transfers the double-dollar-suffixed pending collector (and any
    /// already-materialized value under that suffix) back to the parent's
    /// real `output` id, now that the for-each is gone and the value is safe
    /// to expose to downstream actions.
    fn retire_output_collector(&mut self, fe: &ForEachAction) {
        let Some(output) = &fe.output else { return };
        let pending_key = pending_output_id(&output.id);
        if let Some(vars) = self.for_each_outputs_to_be_collected.shift_remove(&pending_key) {
            self.for_each_outputs_to_be_collected.insert(output.id.clone(), vars);
        }
        if let Some(value) = self.variable_values.shift_remove(&pending_key) {
            self.variable_values.insert(output.id.clone(), value);
        }
    }

    fn next_iteration(&mut self, enumerator_id: &str) -> u64 {
        match self.iterations.get_mut(enumerator_id) {
            Some(counter) => {
                *counter += 1;
                *counter
            }
            None => {
                self.iterations.insert(enumerator_id.to_string(), 0);
                0
            }
        }
    }
}

pub(crate) fn recursive_input_id(input_id: &str, enumerator_id: &str) -> String {
    format!("{input_id}${enumerator_id}")
}

pub(crate) fn pending_output_id(output_id: &str) -> String {
    format!("{output_id}$$")
}

/// Deep-copies one body action, applying the enumerator substitution and
/// renaming `ExecuteAction` outputs to their per-iteration identity
/// (`origId$iteration`), recording each such rename into `subst` so later
/// references within the same iteration (sibling actions, or the parent's
/// `yieldToOutput`/`yieldToInput`) resolve correctly.
fn deep_copy_with_subst(action: &Action, iteration: u64, subst: &mut std::collections::HashMap<String, Variable>) -> Action {
    match action {
        Action::Execute(ea) => {
            let inputs = substitute_parameters(&ea.inputs, subst);
            let outputs = ea
                .outputs
                .iter()
                .map(|p| {
                    let new_var = Variable { id: format!("{}${iteration}", p.variable.id), value: p.variable.value.clone() };
                    subst.insert(p.variable.id.clone(), new_var.clone());
                    Parameter { id: p.id.clone(), variable: new_var, prefix: p.prefix.clone(), store: p.store }
                })
                .collect();
            Action::Execute(ExecuteAction { action_id: ActionId::fresh(), service_id: ea.service_id.clone(), inputs, outputs })
        }
        Action::ForEach(nested) => {
            let input = subst.get(&nested.input.id).cloned().unwrap_or_else(|| nested.input.clone());
            let body = nested.actions.iter().map(|a| deep_copy_with_subst(a, iteration, subst)).collect();
            Action::ForEach(ForEachAction {
                action_id: ActionId::fresh(),
                input,
                enumerator: nested.enumerator.clone(),
                output: nested.output.clone(),
                yield_to_output: nested.yield_to_output.clone(),
                yield_to_input: nested.yield_to_input.clone(),
                actions: body,
            })
        }
    }
}

fn substitute_parameters(params: &[Parameter], subst: &std::collections::HashMap<String, Variable>) -> Vec<Parameter> {
    params
        .iter()
        .map(|p| Parameter {
            id: p.id.clone(),
            variable: subst.get(&p.variable.id).cloned().unwrap_or_else(|| p.variable.clone()),
            prefix: p.prefix.clone(),
            store: p.store,
        })
        .collect()
}
