//! Pipeline builder with validation.

use super::StageSpec;
use crate::core::RoleKey;
use crate::errors::PipelineValidationError;
use std::collections::{HashMap, HashSet};

/// Builder for creating validated stage plans.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    /// The pipeline name.
    name: String,
    /// Stage specifications in insertion order.
    stages: Vec<StageSpec>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Adds a stage to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage is invalid on its own or its key is
    /// already taken.
    pub fn stage(mut self, spec: StageSpec) -> Result<Self, PipelineValidationError> {
        self.add_stage_spec(spec)?;
        Ok(self)
    }

    /// Adds a stage specification in place.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn add_stage_spec(&mut self, spec: StageSpec) -> Result<(), PipelineValidationError> {
        spec.validate()?;

        if self.stages.iter().any(|s| s.key == spec.key) {
            return Err(PipelineValidationError::new(
                "PIPELINE-DUPLICATE",
                format!("Stage '{}' is defined more than once", spec.key),
            )
            .with_stages(vec![spec.key.to_string()]));
        }

        self.stages.push(spec);
        Ok(())
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Builds the plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder is empty, a stage depends on an unknown
    /// stage, or the dependencies form a cycle.
    pub fn build(self) -> Result<StagePlan, PipelineValidationError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new(
                "PIPELINE-EMPTY",
                "Pipeline has no stages",
            ));
        }

        let known: HashSet<RoleKey> = self.stages.iter().map(|s| s.key).collect();
        for spec in &self.stages {
            if let Some(dep) = spec.context.iter().find(|d| !known.contains(d)) {
                return Err(PipelineValidationError::new(
                    "PIPELINE-MISSING-DEP",
                    format!("Stage '{}' depends on unknown stage '{dep}'", spec.key),
                )
                .with_stages(vec![spec.key.to_string(), dep.to_string()]));
            }
        }

        self.detect_cycles()?;
        let execution_order = topological_sort(&self.stages);

        Ok(StagePlan {
            name: self.name,
            stages: self.stages,
            execution_order,
        })
    }

    /// Detects cycles in the dependency graph.
    fn detect_cycles(&self) -> Result<(), PipelineValidationError> {
        let graph: HashMap<RoleKey, &StageSpec> = self.stages.iter().map(|s| (s.key, s)).collect();
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for spec in &self.stages {
            if !visited.contains(&spec.key) {
                if let Some(cycle) =
                    dfs_cycle(spec.key, &graph, &mut visited, &mut rec_stack, &mut path)
                {
                    return Err(PipelineValidationError::cycle(
                        cycle.iter().map(ToString::to_string).collect(),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn dfs_cycle(
    node: RoleKey,
    graph: &HashMap<RoleKey, &StageSpec>,
    visited: &mut HashSet<RoleKey>,
    rec_stack: &mut HashSet<RoleKey>,
    path: &mut Vec<RoleKey>,
) -> Option<Vec<RoleKey>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(spec) = graph.get(&node) {
        for &dep in &spec.context {
            if !visited.contains(&dep) {
                if let Some(cycle) = dfs_cycle(dep, graph, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(&dep) {
                let start = path.iter().position(|n| *n == dep).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(dep);
                return Some(cycle);
            }
        }
    }

    path.pop();
    rec_stack.remove(&node);
    None
}

/// Topological order that visits stages in definition order, so a pipeline
/// that is already declared upstream-first keeps its declared order.
fn topological_sort(stages: &[StageSpec]) -> Vec<RoleKey> {
    fn visit(
        node: RoleKey,
        graph: &HashMap<RoleKey, &StageSpec>,
        visited: &mut HashSet<RoleKey>,
        result: &mut Vec<RoleKey>,
    ) {
        if !visited.insert(node) {
            return;
        }
        if let Some(spec) = graph.get(&node) {
            for &dep in &spec.context {
                visit(dep, graph, visited, result);
            }
        }
        result.push(node);
    }

    let graph: HashMap<RoleKey, &StageSpec> = stages.iter().map(|s| (s.key, s)).collect();
    let mut visited = HashSet::new();
    let mut result = Vec::with_capacity(stages.len());
    for spec in stages {
        visit(spec.key, &graph, &mut visited, &mut result);
    }
    result
}

/// A validated, acyclic set of stages with a fixed execution order.
#[derive(Debug, Clone)]
pub struct StagePlan {
    name: String,
    stages: Vec<StageSpec>,
    execution_order: Vec<RoleKey>,
}

impl StagePlan {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stages in definition order.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Returns the stage for a key.
    #[must_use]
    pub fn stage(&self, key: RoleKey) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.key == key)
    }

    /// Keys in an order where every stage follows its dependencies.
    #[must_use]
    pub fn execution_order(&self) -> &[RoleKey] {
        &self.execution_order
    }

    /// Stages in execution order.
    pub fn ordered_stages(&self) -> impl Iterator<Item = &StageSpec> {
        self.execution_order.iter().filter_map(|k| self.stage(*k))
    }

    /// Stages that list `key` as context.
    #[must_use]
    pub fn dependents(&self, key: RoleKey) -> Vec<RoleKey> {
        self.stages
            .iter()
            .filter(|s| s.context.contains(&key))
            .map(|s| s.key)
            .collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}
