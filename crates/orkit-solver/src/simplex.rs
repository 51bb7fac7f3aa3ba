use tracing::{debug, trace};

use crate::problem::{Direction, Problem, activity};
use crate::solution::{Analysis, ConstraintViolation, ReducedCost, ShadowPrice, Solution, SolutionStatus};

/// Floor for the size-derived iteration cap
const MIN_ITERATIONS: usize = 10_000;
/// Phase 1 accepts a residual infeasibility up to `tolerance * FEASIBILITY_SCALE`
const FEASIBILITY_SCALE: f64 = 1e3;

/// Bounded-variable simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum iterations before giving up; derived from the problem size when unset
    max_iterations: Option<usize>,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Consecutive degenerate pivots before pricing falls back to Bland's rule
    bland_after: usize,
    /// Report the current vertex as FEASIBLE when phase 2 runs out of iterations
    feasible_on_limit: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: None,
            tolerance: 1e-9,
            bland_after: 50,
            feasible_on_limit: false,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_bland_after(mut self, pivots: usize) -> Self {
        self.bland_after = pivots;
        self
    }

    pub fn with_feasible_on_limit(mut self, enabled: bool) -> Self {
        self.feasible_on_limit = enabled;
        self
    }

    /// Solve the LP problem using the two-phase bounded-variable simplex method
    pub fn solve(&self, problem: &Problem) -> Solution {
        let mut tableau = self.build_tableau(problem);
        let limit = self.iteration_limit(&tableau);
        debug!(
            problem = %problem.name,
            rows = tableau.n_rows,
            columns = tableau.n_cols(),
            artificials = tableau.n_artificial,
            limit,
            "starting simplex"
        );

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            let phase1_cost = tableau.phase1_cost();
            match self.optimize(&mut tableau, &phase1_cost, limit) {
                SimplexResult::Optimal => {}
                // The phase 1 objective is bounded below by zero
                SimplexResult::Unbounded | SimplexResult::IterationLimit => {
                    debug!(iterations = tableau.iterations, "phase 1 did not converge");
                    return Solution::abnormal(tableau.iterations);
                }
            }
            tableau.recompute_basic_values();

            let infeasibility = tableau.artificial_sum();
            debug!(infeasibility, iterations = tableau.iterations, "phase 1 finished");
            if infeasibility > self.tolerance * FEASIBILITY_SCALE {
                return self.report_infeasible(&tableau, problem);
            }
            tableau.fix_artificials();
        }

        // Phase 2: Optimize
        let cost = tableau.phase2_cost(problem);
        let status = match self.optimize(&mut tableau, &cost, limit) {
            SimplexResult::Optimal => SolutionStatus::Optimal,
            SimplexResult::Unbounded => {
                debug!(iterations = tableau.iterations, "objective is unbounded");
                return Solution::unbounded(problem.objective().direction, tableau.iterations);
            }
            SimplexResult::IterationLimit => {
                debug!(iterations = tableau.iterations, "iteration limit reached in phase 2");
                if !self.feasible_on_limit {
                    return Solution::abnormal(tableau.iterations);
                }
                SolutionStatus::Feasible
            }
        };
        tableau.recompute_basic_values();
        debug!(iterations = tableau.iterations, ?status, "phase 2 finished");

        self.extract_solution(&tableau, problem, &cost, status)
    }

    fn iteration_limit(&self, tableau: &Tableau) -> usize {
        self.max_iterations
            .unwrap_or_else(|| MIN_ITERATIONS.max(50 * (tableau.n_rows + tableau.n_cols())))
    }

    /// Lay out `[A | -I | artificials]` with one logical column per row.
    ///
    /// Each logical carries its row's bounds, so every row reads `A x - r = 0`.
    /// Rows violated at the starting point get a signed artificial in the basis.
    fn build_tableau(&self, problem: &Problem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_rows = problem.num_constraints();

        let mut lower: Vec<f64> = problem
            .variables()
            .iter()
            .map(|v| v.lower)
            .chain(problem.constraints().iter().map(|c| c.lower))
            .collect();
        let mut upper: Vec<f64> = problem
            .variables()
            .iter()
            .map(|v| v.upper)
            .chain(problem.constraints().iter().map(|c| c.upper))
            .collect();

        // Structural variables start at a finite bound, or zero when free
        let mut values = vec![0.0; n_vars + n_rows];
        for j in 0..n_vars {
            values[j] = if lower[j].is_finite() {
                lower[j]
            } else if upper[j].is_finite() {
                upper[j]
            } else {
                0.0
            };
        }

        let mut data = vec![vec![0.0; n_vars + n_rows]; n_rows];
        let mut basis = vec![0; n_rows];
        let mut artificial_rows = Vec::new();

        for (i, c) in problem.constraints().iter().enumerate() {
            for (var, &coef) in &c.coefficients {
                data[i][var.index()] = coef;
            }
            data[i][n_vars + i] = -1.0;

            let lhs = activity(c, &values[..n_vars]);
            if lhs < c.lower - self.tolerance {
                values[n_vars + i] = c.lower;
                artificial_rows.push((i, 1.0));
            } else if lhs > c.upper + self.tolerance {
                values[n_vars + i] = c.upper;
                artificial_rows.push((i, -1.0));
            } else {
                // The logical is basic; scale so its column is +e_i
                for x in data[i].iter_mut() {
                    *x = -*x;
                }
                basis[i] = n_vars + i;
            }
        }

        let n_artificial = artificial_rows.len();
        let n_cols = n_vars + n_rows + n_artificial;
        for row in data.iter_mut() {
            row.resize(n_cols, 0.0);
        }
        lower.resize(n_cols, 0.0);
        upper.resize(n_cols, f64::INFINITY);
        values.resize(n_cols, 0.0);

        for (k, &(i, sign)) in artificial_rows.iter().enumerate() {
            let col = n_vars + n_rows + k;
            data[i][col] = sign;
            for x in data[i].iter_mut() {
                *x *= sign;
            }
            basis[i] = col;
        }

        let mut is_basic = vec![false; n_cols];
        for &b in &basis {
            is_basic[b] = true;
        }

        let mut tableau = Tableau {
            data,
            basis,
            is_basic,
            values,
            lower,
            upper,
            n_vars,
            n_rows,
            n_artificial,
            iterations: 0,
        };
        tableau.recompute_basic_values();
        tableau
    }

    fn optimize(&self, tableau: &mut Tableau, cost: &[f64], limit: usize) -> SimplexResult {
        let mut degenerate_run = 0;

        loop {
            let reduced = tableau.reduced_costs(cost);
            let use_bland = degenerate_run >= self.bland_after;
            let Some((col, direction)) = self.find_pivot_column(tableau, &reduced, use_bland) else {
                return SimplexResult::Optimal;
            };
            if tableau.iterations >= limit {
                return SimplexResult::IterationLimit;
            }
            tableau.iterations += 1;

            let Some(step) = self.find_pivot_row(tableau, col, direction) else {
                return SimplexResult::Unbounded;
            };
            if step.length <= self.tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
            trace!(
                col,
                direction,
                length = step.length,
                leaving_row = ?step.leaving.map(|(row, _)| row),
                bland = use_bland,
                "pivot"
            );
            self.apply_step(tableau, col, direction, &step);
        }
    }

    /// Pick an improving non-basic column and the direction it moves in.
    ///
    /// Largest |reduced cost| wins with the lowest index breaking ties; under
    /// Bland's rule the lowest eligible index wins outright.
    fn find_pivot_column(&self, tableau: &Tableau, reduced: &[f64], use_bland: bool) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        let mut best_score = 0.0;

        for j in 0..tableau.n_cols() {
            if tableau.is_basic[j] || tableau.upper[j] - tableau.lower[j] <= self.tolerance {
                continue;
            }
            let d = reduced[j];
            let direction = if d < -self.tolerance && tableau.values[j] < tableau.upper[j] - self.tolerance {
                1.0
            } else if d > self.tolerance && tableau.values[j] > tableau.lower[j] + self.tolerance {
                -1.0
            } else {
                continue;
            };

            if use_bland {
                return Some((j, direction));
            }
            if d.abs() > best_score {
                best_score = d.abs();
                best = Some((j, direction));
            }
        }

        best
    }

    /// Ratio test over both bounds of every basic variable plus the entering
    /// variable's own opposite bound. `None` means no bound limits the move.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize, direction: f64) -> Option<Step> {
        let mut length = if direction > 0.0 {
            tableau.upper[col] - tableau.values[col]
        } else {
            tableau.values[col] - tableau.lower[col]
        };
        let mut leaving: Option<(usize, f64)> = None;

        for i in 0..tableau.n_rows {
            let rate = -tableau.data[i][col] * direction;
            let b = tableau.basis[i];
            let (limit, bound) = if rate > self.tolerance && tableau.upper[b].is_finite() {
                ((tableau.upper[b] - tableau.values[b]) / rate, tableau.upper[b])
            } else if rate < -self.tolerance && tableau.lower[b].is_finite() {
                ((tableau.values[b] - tableau.lower[b]) / -rate, tableau.lower[b])
            } else {
                continue;
            };
            let limit = limit.max(0.0);

            let better = match leaving {
                None => limit < length - self.tolerance,
                Some((row, _)) => {
                    limit < length - self.tolerance
                        || (limit <= length + self.tolerance && b < tableau.basis[row])
                }
            };
            if better {
                length = limit;
                leaving = Some((i, bound));
            }
        }

        if length.is_finite() {
            Some(Step { length: length.max(0.0), leaving })
        } else {
            None
        }
    }

    fn apply_step(&self, tableau: &mut Tableau, col: usize, direction: f64, step: &Step) {
        let delta = direction * step.length;
        for i in 0..tableau.n_rows {
            let b = tableau.basis[i];
            tableau.values[b] -= tableau.data[i][col] * delta;
        }

        match step.leaving {
            Some((row, bound)) => {
                tableau.values[col] += delta;
                let leaving = tableau.basis[row];
                tableau.values[leaving] = bound;
                self.pivot(tableau, row, col);
            }
            None => {
                // Bound flip: the entering variable crosses to its other bound
                tableau.values[col] = if direction > 0.0 {
                    tableau.upper[col]
                } else {
                    tableau.lower[col]
                };
            }
        }
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_cols = tableau.n_cols();

        // Update basic variable
        let leaving = tableau.basis[row];
        tableau.is_basic[leaving] = false;
        tableau.is_basic[col] = true;
        tableau.basis[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        let pivot_row = tableau.data[row].clone();
        for (i, data_row) in tableau.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = data_row[col];
            if factor != 0.0 {
                for j in 0..n_cols {
                    data_row[j] -= factor * pivot_row[j];
                }
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &Problem, cost: &[f64], status: SolutionStatus) -> Solution {
        let n_vars = problem.num_variables();

        // Extract variable values, snapped into their bounds
        let values: Vec<f64> = (0..n_vars)
            .map(|j| tableau.values[j].clamp(tableau.lower[j], tableau.upper[j]))
            .collect();

        // Recomputed from the final assignment rather than accumulated
        let objective_value = problem.evaluate(&values);

        let analysis = self.analyze(tableau, problem, cost, &values);

        Solution {
            status,
            values,
            objective_value,
            analysis,
            violations: Vec::new(),
            iterations: tableau.iterations,
        }
    }

    fn analyze(&self, tableau: &Tableau, problem: &Problem, cost: &[f64], values: &[f64]) -> Analysis {
        let n_vars = problem.num_variables();
        let reduced = tableau.reduced_costs(cost);
        // The tableau always minimizes; report in the caller's direction
        let sign = match problem.objective().direction {
            Direction::Minimize => 1.0,
            Direction::Maximize => -1.0,
        };

        let reduced_costs = problem
            .variables()
            .iter()
            .enumerate()
            .map(|(j, var)| ReducedCost {
                variable: var.name.clone(),
                value: values[j],
                reduced_cost: if tableau.is_basic[j] { 0.0 } else { sign * reduced[j] },
                is_basic: tableau.is_basic[j],
            })
            .collect();

        // The logical of row i has column -e_i, so its reduced cost is the row's dual
        let mut shadow_prices = Vec::new();
        let mut binding_constraints = Vec::new();
        for (i, constraint) in problem.constraints().iter().enumerate() {
            let lhs = activity(constraint, values);
            let col = n_vars + i;
            let value = if tableau.is_basic[col] { 0.0 } else { sign * reduced[col] };
            shadow_prices.push(ShadowPrice {
                constraint: constraint.name.clone(),
                activity: lhs,
                value,
            });

            let scale = 1.0 + lhs.abs();
            let at_lower = constraint.lower.is_finite() && (lhs - constraint.lower).abs() <= self.tolerance * scale * FEASIBILITY_SCALE;
            let at_upper = constraint.upper.is_finite() && (lhs - constraint.upper).abs() <= self.tolerance * scale * FEASIBILITY_SCALE;
            if at_lower || at_upper {
                binding_constraints.push(constraint.name.clone());
            }
        }

        Analysis {
            shadow_prices,
            reduced_costs,
            binding_constraints,
        }
    }

    /// Report rows still violated at the least-infeasible point phase 1 found
    fn report_infeasible(&self, tableau: &Tableau, problem: &Problem) -> Solution {
        let values = &tableau.values[..tableau.n_vars];
        let tol = self.tolerance * FEASIBILITY_SCALE;
        let mut violations = Vec::new();

        for c in problem.constraints() {
            let lhs = activity(c, values);
            let violation = if lhs < c.lower - tol {
                let amt = c.lower - lhs;
                Some((amt, format!("{} is below minimum of {:.2} by {:.2}", c.name, c.lower, amt)))
            } else if lhs > c.upper + tol {
                let amt = lhs - c.upper;
                Some((amt, format!("{} exceeds maximum of {:.2} by {:.2}", c.name, c.upper, amt)))
            } else {
                None
            };

            if let Some((violation_amount, description)) = violation {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    lower: c.lower,
                    upper: c.upper,
                    activity: lhs,
                    violation_amount,
                    description,
                });
            }
        }

        // Sort by violation amount (worst first)
        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));

        Solution::infeasible_with_violations(violations, tableau.iterations)
    }
}

/// Dense tableau `B^-1 [A | -I | artificials]` with explicit variable values.
///
/// Columns are laid out as structural variables, then one logical per row,
/// then artificials. Non-basic values sit at a bound (or zero when free).
struct Tableau {
    data: Vec<Vec<f64>>,
    basis: Vec<usize>,
    is_basic: Vec<bool>,
    values: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    n_vars: usize,
    n_rows: usize,
    n_artificial: usize,
    iterations: usize,
}

impl Tableau {
    fn n_cols(&self) -> usize {
        self.lower.len()
    }

    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_rows
    }

    fn phase1_cost(&self) -> Vec<f64> {
        let mut cost = vec![0.0; self.n_cols()];
        for c in cost.iter_mut().skip(self.artificial_start()) {
            *c = 1.0;
        }
        cost
    }

    fn phase2_cost(&self, problem: &Problem) -> Vec<f64> {
        let objective = problem.objective();
        let sign = match objective.direction {
            Direction::Minimize => 1.0,
            Direction::Maximize => -1.0,
        };
        let mut cost = vec![0.0; self.n_cols()];
        for (var, &coef) in &objective.coefficients {
            cost[var.index()] = sign * coef;
        }
        cost
    }

    fn artificial_sum(&self) -> f64 {
        self.values[self.artificial_start()..].iter().sum()
    }

    /// Pin artificials at zero; basic ones leave at the first pivot that needs their row
    fn fix_artificials(&mut self) {
        let start = self.artificial_start();
        for j in start..self.n_cols() {
            self.upper[j] = 0.0;
            if !self.is_basic[j] {
                self.values[j] = 0.0;
            }
        }
    }

    fn reduced_costs(&self, cost: &[f64]) -> Vec<f64> {
        let mut reduced = cost.to_vec();
        for (row, &b) in self.data.iter().zip(&self.basis) {
            let cb = cost[b];
            if cb != 0.0 {
                for (d, &a) in reduced.iter_mut().zip(row) {
                    *d -= cb * a;
                }
            }
        }
        for (d, &basic) in reduced.iter_mut().zip(&self.is_basic) {
            if basic {
                *d = 0.0;
            }
        }
        reduced
    }

    /// Basic values follow from `x_B = -sum(T_j * x_j)` over non-basic columns
    fn recompute_basic_values(&mut self) {
        let basic_values: Vec<f64> = self
            .data
            .iter()
            .map(|row| {
                -row.iter()
                    .zip(&self.values)
                    .zip(&self.is_basic)
                    .filter(|&(_, &basic)| !basic)
                    .map(|((&a, &x), _)| a * x)
                    .sum::<f64>()
            })
            .collect();
        for (i, value) in basic_values.into_iter().enumerate() {
            let b = self.basis[i];
            self.values[b] = value;
        }
    }
}

struct Step {
    length: f64,
    /// Row whose basic variable leaves, and the bound it lands on
    leaving: Option<(usize, f64)>,
}

enum SimplexResult {
    Optimal,
    Unbounded,
    IterationLimit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Problem;

    const INF: f64 = f64::INFINITY;

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        //   x, y >= 0
        // Optimal: x=3, y=1, obj=11
        let mut problem = Problem::new("max");
        let x = problem.add_variable("x", 0.0, INF).unwrap();
        let y = problem.add_variable("y", 0.0, INF).unwrap();
        problem.set_objective_coefficient(x, 3.0).unwrap();
        problem.set_objective_coefficient(y, 2.0).unwrap();
        problem.maximize();
        let sum = problem.add_constraint("sum", f64::NEG_INFINITY, 4.0).unwrap();
        problem.set_coefficient(sum, x, 1.0).unwrap();
        problem.set_coefficient(sum, y, 1.0).unwrap();
        let x_max = problem.add_constraint("x_max", f64::NEG_INFINITY, 3.0).unwrap();
        problem.set_coefficient(x_max, x, 1.0).unwrap();
        let y_max = problem.add_constraint("y_max", f64::NEG_INFINITY, 3.0).unwrap();
        problem.set_coefficient(y_max, y, 1.0).unwrap();

        let solver = Solver::new();
        let solution = solver.solve(&problem);

        println!("Status: {:?}", solution.status);
        println!("Values: {:?}", solution.values);
        println!("Objective: {}", solution.objective_value);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 11.0).abs() < 1e-6, "obj = {} (expected 11)", solution.objective_value);

        // Relaxing `sum` by one unit buys one more y, worth 2
        let sum_price = &solution.analysis.shadow_prices[0];
        assert!((sum_price.value - 2.0).abs() < 1e-6, "sum dual = {}", sum_price.value);
        assert!(solution.analysis.binding_constraints.contains(&"sum".to_string()));
        assert!(solution.analysis.binding_constraints.contains(&"x_max".to_string()));
        assert!(!solution.analysis.binding_constraints.contains(&"y_max".to_string()));
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        //   x, y >= 0
        // Optimal: x=3, y=1, obj=9
        let mut problem = Problem::new("min");
        let x = problem.add_variable("x", 0.0, 3.0).unwrap();
        let y = problem.add_variable("y", 0.0, 3.0).unwrap();
        problem.set_objective_coefficient(x, 2.0).unwrap();
        problem.set_objective_coefficient(y, 3.0).unwrap();
        let sum = problem.add_constraint("sum", 4.0, INF).unwrap();
        problem.set_coefficient(sum, x, 1.0).unwrap();
        problem.set_coefficient(sum, y, 1.0).unwrap();

        let solver = Solver::new();
        let solution = solver.solve(&problem);

        println!("Status: {:?}", solution.status);
        println!("Values: {:?}", solution.values);
        println!("Objective: {}", solution.objective_value);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 9.0).abs() < 1e-6, "obj = {} (expected 9)", solution.objective_value);

        // x sits at its upper bound; raising its cost by 1 would make y as attractive
        let rc_x = &solution.analysis.reduced_costs[0];
        assert!(!rc_x.is_basic);
        assert!((rc_x.reduced_cost + 1.0).abs() < 1e-6, "rc(x) = {}", rc_x.reduced_cost);
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let mut problem = Problem::new("infeasible");
        let x = problem.add_variable("x", 0.0, INF).unwrap();
        problem.set_objective_coefficient(x, 1.0).unwrap();
        let lower = problem.add_constraint("lower", 5.0, INF).unwrap();
        problem.set_coefficient(lower, x, 1.0).unwrap();
        let upper = problem.add_constraint("upper", f64::NEG_INFINITY, 3.0).unwrap();
        problem.set_coefficient(upper, x, 1.0).unwrap();

        let solver = Solver::new();
        let solution = solver.solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
        assert_eq!(solution.value(x), None);

        // The least-infeasible point leaves a total gap of 2 between the two rows
        let total: f64 = solution.violations.iter().map(|v| v.violation_amount).sum();
        assert!((total - 2.0).abs() < 1e-6, "total violation = {}", total);
        println!("Violations: {:?}", solution.violations);
    }

    #[test]
    fn test_fixed_variable_cannot_meet_row() {
        let mut problem = Problem::new("fixed");
        let x = problem.add_variable("x", 0.0, 0.0).unwrap();
        problem.set_objective_coefficient(x, 1.0).unwrap();
        let row = problem.add_constraint("at_least_one", 1.0, INF).unwrap();
        problem.set_coefficient(row, x, 1.0).unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert_eq!(solution.violations.len(), 1);
        assert_eq!(solution.violations[0].constraint, "at_least_one");
        assert!((solution.violations[0].violation_amount - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unbounded() {
        let mut problem = Problem::new("unbounded");
        let x = problem.add_variable("x", 0.0, INF).unwrap();
        let y = problem.add_variable("y", 0.0, 1.0).unwrap();
        problem.set_objective_coefficient(x, 1.0).unwrap();
        problem.set_objective_coefficient(y, 1.0).unwrap();
        problem.maximize();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert_eq!(solution.objective_value, INF);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_bound_flip_without_rows() {
        // No constraints at all: every variable just moves to its better bound
        let mut problem = Problem::new("boxes");
        let x = problem.add_variable("x", -1.0, 2.0).unwrap();
        let y = problem.add_variable("y", -3.0, 4.0).unwrap();
        problem.set_objective_coefficient(x, 1.0).unwrap();
        problem.set_objective_coefficient(y, -2.0).unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![-1.0, 4.0]);
        assert!((solution.objective_value + 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_free_variable_and_equality() {
        // Minimize x subject to x - y = -3, y in [0, 5], x free
        let mut problem = Problem::new("free");
        let x = problem.add_variable("x", f64::NEG_INFINITY, INF).unwrap();
        let y = problem.add_variable("y", 0.0, 5.0).unwrap();
        problem.set_objective_coefficient(x, 1.0).unwrap();
        let eq = problem.add_constraint("link", -3.0, -3.0).unwrap();
        problem.set_coefficient(eq, x, 1.0).unwrap();
        problem.set_coefficient(eq, y, -1.0).unwrap();

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] + 3.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!(solution.values[1].abs() < 1e-6, "y = {}", solution.values[1]);
        assert_eq!(solution.analysis.binding_constraints, vec!["link".to_string()]);
    }

    #[test]
    fn test_beale_cycling_example_terminates() {
        // Beale's example cycles under textbook Dantzig pricing without anti-cycling
        let mut problem = Problem::new("beale");
        let x: Vec<_> = (4..=7)
            .map(|k| problem.add_variable(format!("x{}", k), 0.0, INF).unwrap())
            .collect();
        for (var, coef) in x.iter().zip([-0.75, 20.0, -0.5, 6.0]) {
            problem.set_objective_coefficient(*var, coef).unwrap();
        }
        let r1 = problem.add_constraint("r1", f64::NEG_INFINITY, 0.0).unwrap();
        for (var, coef) in x.iter().zip([0.25, -8.0, -1.0, 9.0]) {
            problem.set_coefficient(r1, *var, coef).unwrap();
        }
        let r2 = problem.add_constraint("r2", f64::NEG_INFINITY, 0.0).unwrap();
        for (var, coef) in x.iter().zip([0.5, -12.0, -0.5, 3.0]) {
            problem.set_coefficient(r2, *var, coef).unwrap();
        }
        let r3 = problem.add_constraint("r3", f64::NEG_INFINITY, 1.0).unwrap();
        problem.set_coefficient(r3, x[2], 1.0).unwrap();

        for solver in [Solver::new(), Solver::new().with_bland_after(0)] {
            let solution = solver.solve(&problem);
            assert_eq!(solution.status, SolutionStatus::Optimal);
            assert!((solution.objective_value + 1.25).abs() < 1e-6, "obj = {}", solution.objective_value);
            assert!(problem.is_feasible(&solution.values, 1e-6));
        }
    }

    #[test]
    fn test_iteration_limit_is_abnormal() {
        let mut problem = Problem::new("limited");
        let x = problem.add_variable("x", 0.0, INF).unwrap();
        let y = problem.add_variable("y", 0.0, INF).unwrap();
        problem.set_objective_coefficient(x, 1.0).unwrap();
        problem.set_objective_coefficient(y, 1.0).unwrap();
        let row = problem.add_constraint("demand", 2.0, INF).unwrap();
        problem.set_coefficient(row, x, 1.0).unwrap();
        problem.set_coefficient(row, y, 1.0).unwrap();

        let solution = Solver::new().with_max_iterations(0).solve(&problem);
        assert_eq!(solution.status, SolutionStatus::Abnormal);
        assert!(solution.values.is_empty());

        let solution = Solver::new().solve(&problem);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_feasible_on_limit_keeps_phase2_point() {
        // Starting at zero is feasible, so every pivot belongs to phase 2
        let mut problem = Problem::new("limited");
        let x = problem.add_variable("x", 0.0, INF).unwrap();
        let y = problem.add_variable("y", 0.0, INF).unwrap();
        problem.set_objective_coefficient(x, 1.0).unwrap();
        problem.set_objective_coefficient(y, 2.0).unwrap();
        problem.maximize();
        let row = problem.add_constraint("cap", f64::NEG_INFINITY, 4.0).unwrap();
        problem.set_coefficient(row, x, 1.0).unwrap();
        problem.set_coefficient(row, y, 1.0).unwrap();

        let solution = Solver::new()
            .with_max_iterations(0)
            .with_feasible_on_limit(true)
            .solve(&problem);
        assert_eq!(solution.status, SolutionStatus::Feasible);
        assert_eq!(solution.values, vec![0.0, 0.0]);
        assert_eq!(solution.value(x), Some(0.0));

        let solution = Solver::new().with_feasible_on_limit(true).solve(&problem);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_objective_offset_is_reported() {
        let mut problem = Problem::new("offset");
        let x = problem.add_variable("x", 1.0, 2.0).unwrap();
        problem.set_objective_coefficient(x, 2.0).unwrap();
        problem.set_objective_offset(10.0).unwrap();

        let solution = Solver::new().solve(&problem);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_problem() {
        let problem = Problem::new("empty");
        let solution = Solver::new().solve(&problem);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!(solution.values.is_empty());
        assert_eq!(solution.objective_value, 0.0);
        assert_eq!(solution.iterations, 0);
    }
}
