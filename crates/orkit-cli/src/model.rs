use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use orkit_solver::{AssignmentError, CostMatrix, Direction, Problem, ProblemError, VarId};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown variable {variable} in {context}")]
    UnknownVariable { variable: String, context: String },
    #[error("Duplicate variable: {0}")]
    DuplicateVariable(String),
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

/// A linear program as written in a JSON model file.
///
/// Missing bounds are open. Coefficients refer to variables by name.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Model {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub direction: Direction,
    pub variables: Vec<VariableSpec>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
    #[serde(default)]
    pub objective: BTreeMap<String, f64>,
    #[serde(default)]
    pub offset: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableSpec {
    pub name: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintSpec {
    pub name: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
}

fn default_name() -> String {
    "model".to_string()
}

impl Model {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Resolve names and build a solver problem
    pub fn compile(&self) -> Result<Problem, ModelError> {
        let mut problem = Problem::new(self.name.clone());
        let mut symbols: HashMap<&str, VarId> = HashMap::new();

        for spec in &self.variables {
            let var = problem.add_variable(
                spec.name.clone(),
                spec.lower.unwrap_or(f64::NEG_INFINITY),
                spec.upper.unwrap_or(f64::INFINITY),
            )?;
            if symbols.insert(spec.name.as_str(), var).is_some() {
                return Err(ModelError::DuplicateVariable(spec.name.clone()));
            }
        }

        let resolve = |name: &str, context: &str| {
            symbols.get(name).copied().ok_or_else(|| ModelError::UnknownVariable {
                variable: name.to_string(),
                context: context.to_string(),
            })
        };

        for spec in &self.constraints {
            let row = problem.add_constraint(
                spec.name.clone(),
                spec.lower.unwrap_or(f64::NEG_INFINITY),
                spec.upper.unwrap_or(f64::INFINITY),
            )?;
            for (name, &coef) in &spec.coefficients {
                let var = resolve(name.as_str(), spec.name.as_str())?;
                problem.set_coefficient(row, var, coef)?;
            }
        }

        for (name, &coef) in &self.objective {
            let var = resolve(name.as_str(), "objective")?;
            problem.set_objective_coefficient(var, coef)?;
        }
        problem.set_objective_offset(self.offset)?;
        problem.set_direction(self.direction);

        Ok(problem)
    }
}

/// Load a worker-by-task cost matrix stored as a JSON array of rows
pub fn load_costs(path: &Path) -> Result<CostMatrix, ModelError> {
    let source = std::fs::read_to_string(path)?;
    parse_costs(&source)
}

pub fn parse_costs(source: &str) -> Result<CostMatrix, ModelError> {
    let rows: Vec<Vec<f64>> = serde_json::from_str(source)?;
    Ok(CostMatrix::new(rows)?)
}
