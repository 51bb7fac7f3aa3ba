use crate::problem::{Direction, VarId};

/// The result of solving an LP problem
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Values for each variable, in problem order (empty unless the status has values)
    pub values: Vec<f64>,
    /// Objective value at `values`, including the objective offset.
    /// Serialized as `"inf"`, `"-inf"` or `"NaN"` when not finite.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_objective"))]
    pub objective_value: f64,
    /// Detailed analysis
    pub analysis: Analysis,
    /// Constraint violations (populated when infeasible)
    pub violations: Vec<ConstraintViolation>,
    /// Simplex iterations spent across both phases
    pub iterations: usize,
}

#[cfg(feature = "serde")]
fn serialize_objective<S: serde::Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if *value > 0.0 {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// A feasible solution was found but optimality is not proven
    Feasible,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The solver stopped without a trustworthy answer (iteration limit)
    Abnormal,
}

impl SolutionStatus {
    /// Whether variable values may be read for this status
    pub fn has_values(self) -> bool {
        matches!(self, SolutionStatus::Optimal | SolutionStatus::Feasible)
    }
}

/// Detailed analysis of the optimal solution
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Analysis {
    /// Dual values for each constraint, in the objective's direction.
    /// Indicates how much the objective would change per unit relaxation of the row.
    pub shadow_prices: Vec<ShadowPrice>,

    /// Reduced costs for each variable
    /// For non-basic variables, indicates how much cost must change to enter solution
    pub reduced_costs: Vec<ReducedCost>,

    /// Which constraints are binding (tight) at optimum
    pub binding_constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShadowPrice {
    /// Constraint name
    pub constraint: String,
    /// Row activity at the solution
    pub activity: f64,
    /// Shadow price value
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Reduced cost
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

/// Information about a violated constraint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    pub lower: f64,
    pub upper: f64,
    /// Activity at the least-infeasible point found
    pub activity: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

impl Solution {
    /// Value of `var`, if the status carries values
    pub fn value(&self, var: VarId) -> Option<f64> {
        if self.status.has_values() {
            self.values.get(var.index()).copied()
        } else {
            None
        }
    }

    pub fn infeasible_with_violations(violations: Vec<ConstraintViolation>, iterations: usize) -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: Vec::new(),
            objective_value: f64::INFINITY,
            analysis: Analysis::default(),
            violations,
            iterations,
        }
    }

    pub fn unbounded(direction: Direction, iterations: usize) -> Self {
        let objective_value = match direction {
            Direction::Minimize => f64::NEG_INFINITY,
            Direction::Maximize => f64::INFINITY,
        };
        Self {
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            objective_value,
            analysis: Analysis::default(),
            violations: Vec::new(),
            iterations,
        }
    }

    pub fn abnormal(iterations: usize) -> Self {
        Self {
            status: SolutionStatus::Abnormal,
            values: Vec::new(),
            objective_value: f64::NAN,
            analysis: Analysis::default(),
            violations: Vec::new(),
            iterations,
        }
    }
}
