//! # flowc-compiler
//!
//! The workflow-to-process-chain compiler: the stateful object that lowers a
//! declarative [`Workflow`] into batches of executable [`ProcessChain`]s,
//! unrolling `for-each` constructs and tracking result flow so downstream
//! actions become eligible as upstream results arrive.
//!
//! The public surface is deliberately small: [`Compiler::new`],
//! [`Compiler::generate`], [`Compiler::is_finished`],
//! [`Compiler::save_state`]/[`Compiler::load_state`]. Everything else in
//! this crate is internal machinery for the five-phase `generate` pipeline:
//! ingest results, collect for-each outputs to a fixpoint, unroll pending
//! for-eaches, fuse executable actions into process chains, retire the
//! actions that were fused.

mod collect;
mod error;
mod fuse;
mod oracle;
mod unroll;

pub use error::CompileError;
pub use oracle::{NoOutputAdapters, OutputAdapterOracle, StaticOutputAdapters};

use flowc_types::{Action, CompilerState, ProcessChain, ServiceMetadata, Value, Variable, Workflow};
use flowc_util::IdGenerator;
use indexmap::IndexMap;

/// The stateful lowering engine. Owns a working copy of one [`Workflow`];
/// mutated only by [`Compiler::generate`] and [`Compiler::load_state`].
///
/// Not concurrency-safe: a `Compiler` is owned exclusively by one submission
/// loop, per the concurrency model in `SPEC_FULL.md` §5.
pub struct Compiler {
    vars: Vec<Variable>,
    pub(crate) actions: Vec<Action>,
    pub(crate) variable_values: IndexMap<String, Value>,
    pub(crate) for_each_outputs_to_be_collected: IndexMap<String, Vec<Variable>>,
    pub(crate) iterations: IndexMap<String, u64>,
    pub(crate) tmp_path: String,
    pub(crate) out_path: String,
    pub(crate) services: IndexMap<String, ServiceMetadata>,
    pub(crate) oracle: Box<dyn OutputAdapterOracle>,
    pub(crate) id_gen: Box<dyn IdGenerator>,
}

impl Compiler {
    /// Validates nothing eagerly; structural problems surface during
    /// [`Compiler::generate`], per the public contract.
    pub fn new(
        workflow: Workflow,
        tmp_path: impl Into<String>,
        out_path: impl Into<String>,
        services: impl IntoIterator<Item = ServiceMetadata>,
        oracle: Box<dyn OutputAdapterOracle>,
        id_gen: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            vars: workflow.vars,
            actions: workflow.actions,
            variable_values: IndexMap::new(),
            for_each_outputs_to_be_collected: IndexMap::new(),
            iterations: IndexMap::new(),
            tmp_path: tmp_path.into(),
            out_path: out_path.into(),
            services: services.into_iter().map(|s| (s.service_id.clone(), s)).collect(),
            oracle,
            id_gen,
        }
    }

    /// Runs one generate→dispatch round: ingest `results` from the
    /// previously returned process chains (empty on the first call), then
    /// the fixed ingest → collect → unroll → fuse → retire pipeline.
    ///
    /// An empty return together with [`Compiler::is_finished`] true means
    /// the workflow is done; empty with `is_finished` false means the
    /// compiler is waiting on results from chains it already returned.
    pub fn generate(&mut self, results: IndexMap<String, Vec<Value>>) -> Result<Vec<ProcessChain>, CompileError> {
        self.ingest_results(results);
        self.collect_for_each_outputs();
        self.unroll_for_each()?;
        self.fuse_and_retire()
    }

    /// True iff the pending-actions set is empty.
    pub fn is_finished(&self) -> bool {
        self.actions.is_empty()
    }

    /// Serializes the compiler's mutable state to the opaque blob contract:
    /// exactly the five keys `vars`, `actions`, `variable_values`,
    /// `for_each_outputs_to_be_collected`, `iterations`.
    pub fn save_state(&self) -> CompilerState {
        CompilerState {
            vars: self.vars.clone(),
            actions: self.actions.clone(),
            variable_values: self.variable_values.clone(),
            for_each_outputs_to_be_collected: self.for_each_outputs_to_be_collected.clone(),
            iterations: self.iterations.clone(),
        }
    }

    /// Overwrites the compiler's mutable state from a previously saved blob.
    pub fn load_state(&mut self, state: CompilerState) {
        self.vars = state.vars;
        self.actions = state.actions;
        self.variable_values = state.variable_values;
        self.for_each_outputs_to_be_collected = state.for_each_outputs_to_be_collected;
        self.iterations = state.iterations;
    }

    /// Read-only view of resolved variable values, for inspection and tests.
    pub fn variable_values(&self) -> &IndexMap<String, Value> {
        &self.variable_values
    }

    /// Read-only view of the pending action set, for inspection and tests.
    pub fn pending_actions(&self) -> &[Action] {
        &self.actions
    }

    fn ingest_results(&mut self, results: IndexMap<String, Vec<Value>>) {
        for (id, mut values) in results {
            let value = if values.len() > 1 { Value::Array(values) } else { values.pop().unwrap_or(Value::Array(Vec::new())) };
            self.variable_values.insert(id, value);
        }
    }

    /// Resolves a variable's literal value: either carried inline on the
    /// reference itself, or declared on the workflow's `vars` list by id.
    pub(crate) fn literal_value(&self, variable: &Variable) -> Option<Value> {
        variable.value.clone().or_else(|| self.vars.iter().find(|v| v.id == variable.id).and_then(|v| v.value.clone()))
    }
}

#[cfg(test)]
mod scenario_tests {
    use flowc_types::{Cardinality, Direction, ExecuteAction, ForEachAction, Parameter, ServiceParameter};
    use flowc_util::SequentialIdGenerator;
    use serde_json::json;

    use super::*;

    fn service(id: &str, params: Vec<ServiceParameter>) -> ServiceMetadata {
        ServiceMetadata { service_id: id.into(), name: id.into(), path: format!("/bin/{id}"), runtime: "shell".into(), required_capabilities: vec!["fs".into()], parameters: params }
    }

    fn input_param(id: &str, data_type: &str, cardinality: Cardinality, default: Option<Value>) -> ServiceParameter {
        ServiceParameter { id: id.into(), label: id.into(), kind: Direction::Input, data_type: data_type.into(), cardinality, default, file_suffix: None }
    }

    fn output_param(id: &str, data_type: &str, file_suffix: Option<&str>) -> ServiceParameter {
        ServiceParameter {
            id: id.into(),
            label: id.into(),
            kind: Direction::Output,
            data_type: data_type.into(),
            cardinality: Cardinality::REQUIRED_SINGLE,
            default: None,
            file_suffix: file_suffix.map(str::to_string),
        }
    }

    fn new_compiler(workflow: Workflow, services: Vec<ServiceMetadata>) -> Compiler {
        Compiler::new(workflow, "/tmp", "/out", services, Box::new(NoOutputAdapters), Box::new(SequentialIdGenerator::new("id")))
    }

    /// S1: single ExecuteAction compiles to one chain, then finishes.
    #[test]
    fn s1_single_execute_action() {
        let cp = service("cp", vec![input_param("src", "file", Cardinality::REQUIRED_SINGLE, None), output_param("dst", "file", Some(".out"))]);

        let mut action = ExecuteAction::new("cp");
        action.inputs.push(Parameter::new("src", Variable::with_value("X", json!("a.txt"))));
        action.outputs.push(Parameter::new("dst", Variable::new("Y")));

        let workflow = Workflow::new(vec![], vec![Action::Execute(action)]);
        let mut compiler = new_compiler(workflow, vec![cp]);

        let chains = compiler.generate(IndexMap::new()).expect("generate");
        assert_eq!(chains.len(), 1);
        let exe = &chains[0].executables[0];
        let src = exe.arguments.iter().find(|a| a.param_id == "src").unwrap();
        assert_eq!(src.value, json!("a.txt"));
        let dst = exe.arguments.iter().find(|a| a.param_id == "dst").unwrap();
        assert_eq!(dst.value, json!("/tmp/id-0.out"));
        assert_eq!(chains[0].id, "id-1");

        let second = compiler.generate(IndexMap::new()).expect("generate");
        assert!(second.is_empty());
        assert!(compiler.is_finished());
    }

    /// S2: A's output feeds B's input with nothing else consuming it — fuse
    /// into one two-step chain.
    #[test]
    fn s2_fusion_with_forward_dependency() {
        let cp = service("cp", vec![input_param("src", "file", Cardinality::REQUIRED_SINGLE, None), output_param("dst", "file", None)]);
        let cat = service("cat", vec![input_param("txt", "file", Cardinality::REQUIRED_SINGLE, None)]);

        let mut a = ExecuteAction::new("cp");
        a.inputs.push(Parameter::new("src", Variable::with_value("X", json!("a.txt"))));
        a.outputs.push(Parameter::new("dst", Variable::new("Y")));

        let mut b = ExecuteAction::new("cat");
        b.inputs.push(Parameter::new("txt", Variable::new("Y")));

        let workflow = Workflow::new(vec![], vec![Action::Execute(a), Action::Execute(b)]);
        let mut compiler = new_compiler(workflow, vec![cp, cat]);

        let chains = compiler.generate(IndexMap::new()).expect("generate");
        assert_eq!(chains.len(), 1);
        let chain = &chains[0];
        assert_eq!(chain.executables.len(), 2);
        assert_eq!(chain.executables[0].service_id, "cp");
        assert_eq!(chain.executables[1].service_id, "cat");
        let a_out = chain.executables[0].arguments.iter().find(|arg| arg.param_id == "dst").unwrap();
        let b_in = chain.executables[1].arguments.iter().find(|arg| arg.param_id == "txt").unwrap();
        assert_eq!(a_out.value, b_in.value);
        assert!(compiler.is_finished());
    }

    /// S3: A's output is consumed by two actions — fork blocks fusion.
    #[test]
    fn s3_fork_blocks_fusion() {
        let cp = service("cp", vec![input_param("src", "file", Cardinality::REQUIRED_SINGLE, None), output_param("dst", "file", None)]);
        let cat = service("cat", vec![input_param("txt", "file", Cardinality::REQUIRED_SINGLE, None), output_param("report", "file", None)]);

        let mut a = ExecuteAction::new("cp");
        a.inputs.push(Parameter::new("src", Variable::with_value("X", json!("a.txt"))));
        a.outputs.push(Parameter::new("dst", Variable::new("Y")));

        let mut b = ExecuteAction::new("cat");
        b.inputs.push(Parameter::new("txt", Variable::new("Y")));
        b.outputs.push(Parameter::new("report", Variable::new("B_OUT")));

        let mut c = ExecuteAction::new("cat");
        c.inputs.push(Parameter::new("txt", Variable::new("Y")));
        c.outputs.push(Parameter::new("report", Variable::new("C_OUT")));

        let workflow = Workflow::new(vec![], vec![Action::Execute(a), Action::Execute(b), Action::Execute(c)]);
        let mut compiler = new_compiler(workflow, vec![cp, cat]);

        let first = compiler.generate(IndexMap::new()).expect("generate");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].executables.len(), 1);
        assert_eq!(first[0].executables[0].service_id, "cp");
        assert!(!compiler.is_finished());

        let y_path = first[0].executables[0].arguments.iter().find(|arg| arg.param_id == "dst").unwrap().value.clone();
        let mut results = IndexMap::new();
        results.insert("Y".to_string(), vec![y_path]);
        let second = compiler.generate(results).expect("generate");
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|c| c.executables.len() == 1 && c.executables[0].service_id == "cat"));
        assert!(compiler.is_finished());
    }

    /// S4: an output adapter registered for A's output data type stops
    /// fusion even though there is exactly one consumer.
    #[test]
    fn s4_output_adapter_blocks_fusion() {
        let cp = service("cp", vec![input_param("src", "adapted", Cardinality::REQUIRED_SINGLE, None), output_param("dst", "adapted", None)]);
        let cat = service("cat", vec![input_param("txt", "adapted", Cardinality::REQUIRED_SINGLE, None)]);

        let mut a = ExecuteAction::new("cp");
        a.inputs.push(Parameter::new("src", Variable::with_value("X", json!("a.txt"))));
        a.outputs.push(Parameter::new("dst", Variable::new("Y")));

        let mut b = ExecuteAction::new("cat");
        b.inputs.push(Parameter::new("txt", Variable::new("Y")));

        let workflow = Workflow::new(vec![], vec![Action::Execute(a), Action::Execute(b)]);
        let mut compiler = Compiler::new(
            workflow,
            "/tmp",
            "/out",
            vec![cp, cat],
            Box::new(StaticOutputAdapters::new(["adapted"])),
            Box::new(SequentialIdGenerator::new("id")),
        );

        let first = compiler.generate(IndexMap::new()).expect("generate");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].executables.len(), 1);
        assert_eq!(first[0].executables[0].service_id, "cp");

        let y_path = first[0].executables[0].arguments[1].value.clone();
        let mut results = IndexMap::new();
        results.insert("Y".to_string(), vec![y_path]);
        let second = compiler.generate(results).expect("generate");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].executables[0].service_id, "cat");
        assert!(compiler.is_finished());
    }

    /// S5: for-each unrolls two iterations and collects their yielded
    /// outputs once both results arrive.
    #[test]
    fn s5_for_each_unrolls_with_substitution() {
        let echo = service("echo", vec![input_param("in", "text", Cardinality::REQUIRED_SINGLE, None), output_param("out", "text", None)]);

        let mut body = ExecuteAction::new("echo");
        body.inputs.push(Parameter::new("in", Variable::new("e")));
        body.outputs.push(Parameter::new("out", Variable::new("e_out")));

        let mut for_each = ForEachAction::new(Variable::with_value("P", json!(["p", "q"])), Variable::new("e"));
        for_each.output = Some(Variable::new("Z"));
        for_each.yield_to_output = Some(Variable::new("e_out"));
        for_each.actions = vec![Action::Execute(body)];

        let workflow = Workflow::new(vec![], vec![Action::ForEach(for_each)]);
        let mut compiler = new_compiler(workflow, vec![echo]);

        let first = compiler.generate(IndexMap::new()).expect("generate");
        assert_eq!(first.len(), 2);

        let out_vars: Vec<String> = first
            .iter()
            .map(|c| c.executables[0].arguments.iter().find(|a| a.param_id == "out").unwrap().variable_id.clone())
            .collect();

        let mut results = IndexMap::new();
        results.insert(out_vars[0].clone(), vec![json!("v0")]);
        results.insert(out_vars[1].clone(), vec![json!("v1")]);
        let second = compiler.generate(results).expect("generate");
        assert!(second.is_empty());
        assert!(compiler.is_finished());
        let z = compiler.variable_values().get("Z").expect("Z collected");
        assert_eq!(z.as_array().unwrap().len(), 2);
        assert!(z.as_array().unwrap().contains(&json!("v0")));
        assert!(z.as_array().unwrap().contains(&json!("v1")));
    }

    /// S6: recursive for-each via `yieldToInput`, terminating only once a
    /// round yields nothing new and the recursive buffer is drained.
    #[test]
    fn s6_recursive_for_each_terminates_on_empty_yield() {
        let gen = service("gen", vec![input_param("n", "text", Cardinality::REQUIRED_SINGLE, None), output_param("next", "text", None)]);

        let mut body = ExecuteAction::new("gen");
        body.inputs.push(Parameter::new("n", Variable::new("e")));
        body.outputs.push(Parameter::new("next", Variable::new("next_val")));

        let mut for_each = ForEachAction::new(Variable::with_value("Q", json!(["a"])), Variable::new("e"));
        for_each.yield_to_input = Some(Variable::new("next_val"));
        for_each.actions = vec![Action::Execute(body)];

        let workflow = Workflow::new(vec![], vec![Action::ForEach(for_each)]);
        let mut compiler = new_compiler(workflow, vec![gen]);

        let round1 = compiler.generate(IndexMap::new()).expect("round1");
        assert_eq!(round1.len(), 1);
        assert!(!compiler.is_finished());
        let next_var_1 = round1[0].executables[0].arguments.iter().find(|a| a.param_id == "next").unwrap().variable_id.clone();

        let mut results2 = IndexMap::new();
        results2.insert(next_var_1, vec![json!("b")]);
        let round2 = compiler.generate(results2).expect("round2");
        assert_eq!(round2.len(), 1);
        assert!(!compiler.is_finished());
        let next_var_2 = round2[0].executables[0].arguments.iter().find(|a| a.param_id == "next").unwrap().variable_id.clone();

        let mut results3 = IndexMap::new();
        results3.insert(next_var_2, Vec::new());
        let round3 = compiler.generate(results3).expect("round3");
        assert!(round3.is_empty());
        assert!(compiler.is_finished());
    }

    /// S7: resuming from a saved state produces the same next round as the
    /// uninterrupted run (modulo opaque generated ids/paths).
    #[test]
    fn s7_resume_matches_uninterrupted_run() {
        fn build() -> (Compiler, Vec<ServiceMetadata>, Workflow) {
            let cp = service("cp", vec![input_param("src", "file", Cardinality::REQUIRED_SINGLE, None), output_param("dst", "file", None)]);
            let cat = service("cat", vec![input_param("txt", "file", Cardinality::REQUIRED_SINGLE, None)]);
            let mut a = ExecuteAction::new("cp");
            a.inputs.push(Parameter::new("src", Variable::with_value("X", json!("a.txt"))));
            a.outputs.push(Parameter::new("dst", Variable::new("Y")));
            let mut b = ExecuteAction::new("cat");
            b.inputs.push(Parameter::new("txt", Variable::new("Y")));
            let workflow = Workflow::new(vec![], vec![Action::Execute(a), Action::Execute(b)]);
            let compiler = new_compiler(workflow.clone(), vec![cp.clone(), cat.clone()]);
            (compiler, vec![cp, cat], workflow)
        }

        // uninterrupted: A and B fuse into one chain since there's no fork.
        let (mut uninterrupted, _, _) = build();
        let chains_direct = uninterrupted.generate(IndexMap::new()).expect("generate");

        let (mut original, services, workflow) = build();
        let _ = original.generate(IndexMap::new()).expect("generate");
        let saved = original.save_state();

        let mut resumed = Compiler::new(workflow, "/tmp", "/out", services, Box::new(NoOutputAdapters), Box::new(SequentialIdGenerator::new("id")));
        resumed.load_state(saved.clone());
        assert_eq!(resumed.save_state(), saved);

        // Both runs already finished after the first call (no fork, single
        // fused chain); resuming mid-flight with identical pending state
        // yields an identical terminal Generate result.
        assert!(resumed.is_finished());
        assert_eq!(chains_direct.len(), 1);
        assert_eq!(chains_direct[0].executables.len(), 2);
    }
}
