use std::collections::BTreeMap;

use crate::error::ProblemError;

/// Handle to a variable inside a [`Problem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a constraint row inside a [`Problem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RowId(usize);

impl RowId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Variable {
    pub name: String,
    /// `-INFINITY` if there is no lower bound
    pub lower: f64,
    /// `INFINITY` if there is no upper bound
    pub upper: f64,
}

/// A ranged row: `lower <= sum(coef * x) <= upper`
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    /// Sparse coefficients; unlisted variables have coefficient 0
    pub coefficients: BTreeMap<VarId, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Objective {
    pub coefficients: BTreeMap<VarId, f64>,
    pub direction: Direction,
    /// Constant term added to the reported objective value
    pub offset: f64,
}

/// A linear program over bounded variables.
///
/// Variables live in an arena and are referenced by [`VarId`]; rows and the
/// objective store sparse coefficient maps keyed by those ids, so every
/// reference is checked when it is added.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Problem {
    pub name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Objective,
}

impl Problem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: Objective::default(),
        }
    }

    pub fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> Result<VarId, ProblemError> {
        let name = name.into();
        check_bounds(&name, lower, upper)?;
        self.variables.push(Variable { name, lower, upper });
        Ok(VarId(self.variables.len() - 1))
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> Result<RowId, ProblemError> {
        let name = name.into();
        check_bounds(&name, lower, upper)?;
        self.constraints.push(Constraint {
            name,
            lower,
            upper,
            coefficients: BTreeMap::new(),
        });
        Ok(RowId(self.constraints.len() - 1))
    }

    /// Set the coefficient of `var` in `row`. A zero coefficient removes the entry.
    pub fn set_coefficient(&mut self, row: RowId, var: VarId, value: f64) -> Result<(), ProblemError> {
        self.check_var(var)?;
        let constraint = self
            .constraints
            .get_mut(row.0)
            .ok_or(ProblemError::UnknownConstraint(row.0))?;
        if !value.is_finite() {
            return Err(ProblemError::NonFiniteCoefficient {
                name: constraint.name.clone(),
                value,
            });
        }
        if value == 0.0 {
            constraint.coefficients.remove(&var);
        } else {
            constraint.coefficients.insert(var, value);
        }
        Ok(())
    }

    pub fn set_objective_coefficient(&mut self, var: VarId, value: f64) -> Result<(), ProblemError> {
        self.check_var(var)?;
        if !value.is_finite() {
            return Err(ProblemError::NonFiniteCoefficient {
                name: "objective".to_string(),
                value,
            });
        }
        if value == 0.0 {
            self.objective.coefficients.remove(&var);
        } else {
            self.objective.coefficients.insert(var, value);
        }
        Ok(())
    }

    pub fn set_objective_offset(&mut self, offset: f64) -> Result<(), ProblemError> {
        if !offset.is_finite() {
            return Err(ProblemError::NonFiniteCoefficient {
                name: "objective offset".to_string(),
                value: offset,
            });
        }
        self.objective.offset = offset;
        Ok(())
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.objective.direction = direction;
    }

    pub fn maximize(&mut self) {
        self.set_direction(Direction::Maximize);
    }

    pub fn minimize(&mut self) {
        self.set_direction(Direction::Minimize);
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.0)
    }

    pub fn constraint(&self, id: RowId) -> Option<&Constraint> {
        self.constraints.get(id.0)
    }

    pub fn variable_by_name(&self, name: &str) -> Option<VarId> {
        self.variables.iter().position(|v| v.name == name).map(VarId)
    }

    /// Ids of all variables, in insertion order
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Objective value (including the offset) at `values`.
    ///
    /// # Panics
    ///
    /// Panics if `values` is shorter than the variable list.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .map(|(var, coef)| coef * values[var.0])
            .sum::<f64>()
            + self.objective.offset
    }

    /// Left-hand side of `row` at `values`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is not in this problem or `values` is shorter than
    /// the variable list.
    pub fn row_activity(&self, row: RowId, values: &[f64]) -> f64 {
        activity(&self.constraints[row.0], values)
    }

    /// Check variable bounds and row bounds within `tolerance`
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let bounds_ok = self
            .variables
            .iter()
            .zip(values)
            .all(|(v, &x)| x >= v.lower - tolerance && x <= v.upper + tolerance);
        bounds_ok
            && self.constraints.iter().all(|c| {
                let lhs = activity(c, values);
                lhs >= c.lower - tolerance && lhs <= c.upper + tolerance
            })
    }

    fn check_var(&self, var: VarId) -> Result<(), ProblemError> {
        if var.0 < self.variables.len() {
            Ok(())
        } else {
            Err(ProblemError::UnknownVariable(var.0))
        }
    }
}

pub(crate) fn activity(constraint: &Constraint, values: &[f64]) -> f64 {
    constraint
        .coefficients
        .iter()
        .map(|(var, coef)| coef * values[var.0])
        .sum()
}

fn check_bounds(name: &str, lower: f64, upper: f64) -> Result<(), ProblemError> {
    let valid = !lower.is_nan()
        && !upper.is_nan()
        && lower != f64::INFINITY
        && upper != f64::NEG_INFINITY
        && lower <= upper;
    if valid {
        Ok(())
    } else {
        Err(ProblemError::InvalidBounds {
            name: name.to_string(),
            lower,
            upper,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut problem = Problem::new("bad");
        let err = problem.add_variable("x", 2.0, 1.0).unwrap_err();
        assert!(matches!(err, ProblemError::InvalidBounds { .. }));

        let err = problem.add_constraint("row", 5.0, 4.0).unwrap_err();
        assert!(matches!(err, ProblemError::InvalidBounds { .. }));

        assert!(problem.add_variable("nan", f64::NAN, 1.0).is_err());
        assert!(problem.add_variable("inf", f64::INFINITY, f64::INFINITY).is_err());
        assert!(problem.add_variable("free", f64::NEG_INFINITY, f64::INFINITY).is_ok());
    }

    #[test]
    fn test_dangling_references_rejected() {
        let mut first = Problem::new("first");
        let x = first.add_variable("x", 0.0, 1.0).unwrap();
        first.add_variable("y", 0.0, 1.0).unwrap();

        let mut second = Problem::new("second");
        let row = second.add_constraint("row", 0.0, 1.0).unwrap();

        // x is index 0 but second has no variables yet
        assert_eq!(second.set_coefficient(row, x, 1.0), Err(ProblemError::UnknownVariable(0)));
        assert_eq!(second.set_objective_coefficient(x, 1.0), Err(ProblemError::UnknownVariable(0)));

        let foreign_row = RowId(3);
        assert_eq!(
            first.set_coefficient(foreign_row, x, 1.0),
            Err(ProblemError::UnknownConstraint(3))
        );
    }

    #[test]
    fn test_coefficients_are_sparse() {
        let mut problem = Problem::new("sparse");
        let x = problem.add_variable("x", 0.0, 1.0).unwrap();
        let y = problem.add_variable("y", 0.0, 1.0).unwrap();
        let row = problem.add_constraint("row", 0.0, 4.0).unwrap();

        problem.set_coefficient(row, x, 1.0).unwrap();
        problem.set_coefficient(row, y, 2.0).unwrap();
        problem.set_coefficient(row, y, 0.0).unwrap();
        assert_eq!(problem.constraints()[0].coefficients.len(), 1);

        assert!(problem.set_coefficient(row, x, f64::NAN).is_err());
        assert_eq!(problem.variable_by_name("y"), Some(y));
        assert_eq!(problem.variable_by_name("z"), None);
    }

    #[test]
    fn test_evaluate_and_feasibility() {
        let mut problem = Problem::new("eval");
        let x = problem.add_variable("x", 0.0, 1.0).unwrap();
        let y = problem.add_variable("y", 0.0, 2.0).unwrap();
        let row = problem.add_constraint("ct", 0.0, 2.5).unwrap();
        problem.set_coefficient(row, x, 1.0).unwrap();
        problem.set_coefficient(row, y, 1.0).unwrap();
        problem.set_objective_coefficient(x, 3.0).unwrap();
        problem.set_objective_coefficient(y, 1.0).unwrap();
        problem.set_objective_offset(0.5).unwrap();

        assert!((problem.evaluate(&[1.0, 1.0]) - 4.5).abs() < 1e-12);
        assert!((problem.row_activity(row, &[1.0, 1.0]) - 2.0).abs() < 1e-12);
        assert!(problem.is_feasible(&[1.0, 1.0], 1e-9));
        assert!(!problem.is_feasible(&[1.0, 2.0], 1e-9));
        assert!(!problem.is_feasible(&[1.0], 1e-9));
    }

    #[test]
    #[should_panic]
    fn test_evaluate_panics_on_short_values() {
        let mut problem = Problem::new("short");
        problem.add_variable("x", 0.0, 1.0).unwrap();
        let y = problem.add_variable("y", 0.0, 1.0).unwrap();
        problem.set_objective_coefficient(y, 2.0).unwrap();

        problem.evaluate(&[1.0]);
    }

    #[test]
    #[should_panic]
    fn test_row_activity_panics_on_short_values() {
        let mut problem = Problem::new("short");
        problem.add_variable("x", 0.0, 1.0).unwrap();
        let y = problem.add_variable("y", 0.0, 1.0).unwrap();
        let row = problem.add_constraint("ct", 0.0, 1.0).unwrap();
        problem.set_coefficient(row, y, 1.0).unwrap();

        problem.row_activity(row, &[1.0]);
    }
}
