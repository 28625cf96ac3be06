//! Phases 4 and 5 of `Generate`: process-chain fusion and action retirement.
//!
//! Builds one linear `ProcessChain` per still-pending `ExecuteAction` that
//! hasn't already been swept into an earlier chain this round, fusing a
//! single unambiguous downstream consumer in when dataflow and the output
//! adapter oracle allow it.

use std::collections::{BTreeSet, HashSet};

use flowc_types::{
    Action, ActionId, Argument, Cardinality, Direction, Executable, ExecuteAction, ProcessChain, ServiceParameter, Variable,
    service::DIRECTORY_DATA_TYPE,
    value::to_string_collection,
};
use flowc_util::{make_output_path, merge_to_dir};
use indexmap::IndexMap;

use crate::{Compiler, error::CompileError};

impl Compiler {
    pub(crate) fn fuse_and_retire(&mut self) -> Result<Vec<ProcessChain>, CompileError> {
        let execute_ids: Vec<ActionId> =
            self.actions.iter().filter_map(|a| if let Action::Execute(ea) = a { Some(ea.action_id) } else { None }).collect();

        let mut consumers_by_var: IndexMap<String, Vec<ActionId>> = IndexMap::new();
        for id in &execute_ids {
            let ea = self.execute_action(*id).expect("collected above");
            for input in &ea.inputs {
                consumers_by_var.entry(input.variable.id.clone()).or_default().push(*id);
            }
        }

        let mut consumed: HashSet<ActionId> = HashSet::new();
        let mut chains = Vec::new();

        for start_id in &execute_ids {
            if consumed.contains(start_id) {
                continue;
            }

            let mut executables = Vec::new();
            let mut caps = BTreeSet::new();
            let mut argument_values: IndexMap<String, flowc_types::Value> = IndexMap::new();
            let mut chain_members = Vec::new();
            let mut current_id = *start_id;

            loop {
                let ea = self.execute_action(current_id).expect("pending action exists").clone();
                match self.materialize_execute_action(&ea, &mut argument_values) {
                    Ok(executable) => {
                        let service = &self.services[&ea.service_id];
                        caps.extend(service.required_capabilities.iter().cloned());
                        let stops_here = executable.arguments.iter().any(|a| a.direction == Direction::Output && self.oracle.has_adapter_for(&a.data_type));
                        chain_members.push(current_id);
                        executables.push(executable);

                        if stops_here {
                            break;
                        }

                        let output_ids: HashSet<&String> = ea.outputs.iter().map(|p| &p.variable.id).collect();
                        let mut candidates: HashSet<ActionId> = HashSet::new();
                        for var_id in output_ids {
                            if let Some(ids) = consumers_by_var.get(var_id) {
                                for id in ids {
                                    if *id != current_id && !consumed.contains(id) && !chain_members.contains(id) {
                                        candidates.insert(*id);
                                    }
                                }
                            }
                        }

                        if candidates.len() == 1 {
                            current_id = *candidates.iter().next().expect("len checked");
                        } else {
                            break;
                        }
                    }
                    Err(CompileError::MissingInput { .. }) => break,
                    Err(other) => return Err(other),
                }
            }

            if !executables.is_empty() {
                let id = self.id_gen.next_id();
                tracing::debug!(process_chain = %id, steps = executables.len(), "fused process chain");
                chains.push(ProcessChain::new(id, executables).with_capabilities(caps));
                consumed.extend(chain_members);
            }
        }

        self.actions.retain(|a| !matches!(a, Action::Execute(ea) if consumed.contains(&ea.action_id)));
        Ok(chains)
    }

    fn execute_action(&self, id: ActionId) -> Option<&ExecuteAction> {
        self.actions.iter().find_map(|a| if let Action::Execute(ea) = a { (ea.action_id == id).then_some(ea) } else { None })
    }

    fn materialize_execute_action(
        &mut self,
        ea: &ExecuteAction,
        argument_values: &mut IndexMap<String, flowc_types::Value>,
    ) -> Result<Executable, CompileError> {
        let service = self.services.get(&ea.service_id).cloned().ok_or_else(|| CompileError::UnknownService(ea.service_id.clone()))?;

        let mut arguments = Vec::new();

        for input in &ea.inputs {
            let service_param = service
                .parameter(&input.id, Direction::Input)
                .ok_or_else(|| CompileError::InvalidWorkflow(format!("service `{}` has no input parameter `{}`", service.service_id, input.id)))?;

            let values = self.resolve_input_values(ea.action_id, &input.variable, service_param, argument_values)?;
            for (index, value) in values.iter().enumerate() {
                arguments.push(Argument {
                    param_id: input.id.clone(),
                    label: service_param.label.clone(),
                    variable_id: input.variable.id.clone(),
                    value: flowc_types::Value::String(value.clone()),
                    direction: Direction::Input,
                    data_type: service_param.data_type.clone(),
                });
                if index == 0 {
                    argument_values.entry(input.variable.id.clone()).or_insert_with(|| flowc_types::Value::String(value.clone()));
                }
            }
        }

        for output in &ea.outputs {
            let service_param = service
                .parameter(&output.id, Direction::Output)
                .ok_or_else(|| CompileError::InvalidWorkflow(format!("service `{}` has no output parameter `{}`", service.service_id, output.id)))?;

            if !service_param.cardinality.contains(1) {
                return Err(CompileError::Cardinality { param: service_param.id.clone(), min: service_param.cardinality.min, max: service_param.cardinality.max, got: 1 });
            }

            let base = if output.store { &self.out_path } else { &self.tmp_path };
            let next_id = self.id_gen.next_id();
            let path = make_output_path(base, output.prefix.as_deref(), service_param, &next_id);

            arguments.push(Argument {
                param_id: output.id.clone(),
                label: service_param.label.clone(),
                variable_id: output.variable.id.clone(),
                value: flowc_types::Value::String(path.clone()),
                direction: Direction::Output,
                data_type: service_param.data_type.clone(),
            });
            argument_values.insert(output.variable.id.clone(), flowc_types::Value::String(path));
        }

        Ok(Executable {
            service_id: service.service_id.clone(),
            service_name: service.name.clone(),
            path: service.path.clone(),
            arguments,
            runtime: service.runtime.clone(),
            runtime_arguments: Vec::new(),
            retries: None,
            max_runtime_ms: None,
        })
    }

    /// Resolves one INPUT parameter's values in source-priority order:
    /// literal value, `mergeToDir`-adjusted `variableValues`, a value
    /// already materialized earlier in this same chain, then the service
    /// parameter's default.
    fn resolve_input_values(
        &self,
        action: ActionId,
        variable: &Variable,
        service_param: &ServiceParameter,
        argument_values: &IndexMap<String, flowc_types::Value>,
    ) -> Result<Vec<String>, CompileError> {
        let raw = self
            .literal_value(variable)
            .or_else(|| {
                self.variable_values.get(&variable.id).map(|v| {
                    if service_param.data_type == DIRECTORY_DATA_TYPE {
                        merge_to_dir(v).map(flowc_types::Value::String).unwrap_or_else(|| v.clone())
                    } else {
                        v.clone()
                    }
                })
            })
            .or_else(|| argument_values.get(&variable.id).cloned())
            .or_else(|| service_param.default.clone());

        let mut values = raw.as_ref().map(to_string_collection).unwrap_or_default();

        if values.is_empty() && service_param.cardinality == Cardinality::REQUIRED_SINGLE
            && let Some(default) = &service_param.default
        {
            values = to_string_collection(default);
        }

        if values.is_empty() && service_param.cardinality.min > 0 {
            return Err(CompileError::MissingInput { action, param: service_param.id.clone() });
        }

        if !service_param.cardinality.contains(values.len()) {
            return Err(CompileError::Cardinality {
                param: service_param.id.clone(),
                min: service_param.cardinality.min,
                max: service_param.cardinality.max,
                got: values.len(),
            });
        }

        Ok(values)
    }
}
