pub mod assignment;
mod error;
mod problem;
mod simplex;
mod solution;

pub use assignment::{Assignment, AssignmentSolver, CostMatrix};
pub use error::{AssignmentError, ProblemError};
pub use problem::{Constraint, Direction, Objective, Problem, RowId, VarId, Variable};
pub use simplex::Solver;
pub use solution::{Analysis, ConstraintViolation, ReducedCost, ShadowPrice, Solution, SolutionStatus};
