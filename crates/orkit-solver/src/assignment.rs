//! Minimum-cost assignment of workers to tasks.
//!
//! [`AssignmentSolver`] runs the shortest-augmenting-path form of the
//! Hungarian algorithm over a rectangular cost matrix with at most as many
//! workers as tasks. Dual potentials are kept throughout, so the final
//! `dual_objective` certifies the total cost.
//!
//! [`to_problem`] builds the equivalent 0-1 linear program for cross-checking
//! against the simplex [`crate::Solver`].

use tracing::{debug, trace};

use crate::error::{AssignmentError, ProblemError};
use crate::problem::Problem;

/// Dense worker-by-task cost matrix
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CostMatrix {
    costs: Vec<Vec<f64>>,
    num_tasks: usize,
}

impl CostMatrix {
    pub fn new(costs: Vec<Vec<f64>>) -> Result<Self, AssignmentError> {
        let num_tasks = costs.first().map_or(0, Vec::len);
        for (worker, row) in costs.iter().enumerate() {
            if row.len() != num_tasks {
                return Err(AssignmentError::Ragged {
                    row: worker,
                    expected: num_tasks,
                    found: row.len(),
                });
            }
            if let Some(task) = row.iter().position(|c| !c.is_finite()) {
                return Err(AssignmentError::NonFiniteCost { worker, task });
            }
        }
        Ok(Self { costs, num_tasks })
    }

    pub fn num_workers(&self) -> usize {
        self.costs.len()
    }

    pub fn num_tasks(&self) -> usize {
        self.num_tasks
    }

    pub fn cost(&self, worker: usize, task: usize) -> f64 {
        self.costs[worker][task]
    }

    /// Swap the roles of workers and tasks
    pub fn transposed(&self) -> Self {
        let costs = (0..self.num_tasks)
            .map(|task| self.costs.iter().map(|row| row[task]).collect())
            .collect();
        Self {
            costs,
            num_tasks: self.costs.len(),
        }
    }
}

/// Result of an assignment solve: every worker is matched to a distinct task
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Assignment {
    /// Index i gives the task assigned to worker i
    pub worker_to_task: Vec<usize>,
    /// Sum of the original costs over matched pairs
    pub total_cost: f64,
    /// Sum of worker and task potentials at termination
    pub dual_objective: f64,
}

impl Assignment {
    pub fn task_for(&self, worker: usize) -> Option<usize> {
        self.worker_to_task.get(worker).copied()
    }

    pub fn worker_for(&self, task: usize) -> Option<usize> {
        self.worker_to_task.iter().position(|&t| t == task)
    }

    /// `(worker, task)` pairs in worker order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.worker_to_task.iter().copied().enumerate()
    }

    pub fn len(&self) -> usize {
        self.worker_to_task.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worker_to_task.is_empty()
    }
}

/// Hungarian (primal-dual) solver for rectangular assignment problems
#[derive(Debug, Clone, Default)]
pub struct AssignmentSolver;

impl AssignmentSolver {
    pub fn new() -> Self {
        Self
    }

    /// Match every worker to a distinct task at minimum total cost.
    ///
    /// Requires `workers <= tasks`; transpose or pad the matrix otherwise.
    /// Runs in O(n^2 m) for n workers and m tasks. Ties go to the lowest
    /// task index.
    pub fn solve(&self, matrix: &CostMatrix) -> Result<Assignment, AssignmentError> {
        let n = matrix.num_workers();
        let m = matrix.num_tasks();
        if n > m {
            return Err(AssignmentError::TooManyWorkers { workers: n, tasks: m });
        }
        if n == 0 {
            return Ok(Assignment {
                worker_to_task: Vec::new(),
                total_cost: 0.0,
                dual_objective: 0.0,
            });
        }
        debug!(workers = n, tasks = m, "solving assignment");

        // 1-based with slot 0 as the virtual root of each search
        let mut u = vec![0.0; n + 1];
        let mut v = vec![0.0; m + 1];
        // task_owner[j] is the worker matched to task j, 0 when free
        let mut task_owner = vec![0usize; m + 1];
        let mut way = vec![0usize; m + 1];

        for worker in 1..=n {
            task_owner[0] = worker;
            let mut j0 = 0usize;
            let mut min_slack = vec![f64::INFINITY; m + 1];
            let mut used = vec![false; m + 1];

            // Dijkstra over reduced costs until a free task is reached
            loop {
                used[j0] = true;
                let i0 = task_owner[j0];
                let mut delta = f64::INFINITY;
                let mut j1 = 0usize;

                for j in 1..=m {
                    if used[j] {
                        continue;
                    }
                    let reduced = matrix.cost(i0 - 1, j - 1) - u[i0] - v[j];
                    if reduced < min_slack[j] {
                        min_slack[j] = reduced;
                        way[j] = j0;
                    }
                    if min_slack[j] < delta {
                        delta = min_slack[j];
                        j1 = j;
                    }
                }

                // Shift potentials so reduced costs stay non-negative
                for j in 0..=m {
                    if used[j] {
                        u[task_owner[j]] += delta;
                        v[j] -= delta;
                    } else {
                        min_slack[j] -= delta;
                    }
                }

                j0 = j1;
                if task_owner[j0] == 0 {
                    break;
                }
            }

            // Augment along the alternating path back to the root
            loop {
                let j1 = way[j0];
                task_owner[j0] = task_owner[j1];
                j0 = j1;
                if j0 == 0 {
                    break;
                }
            }
            trace!(worker = worker - 1, "worker matched");
        }

        let mut worker_to_task = vec![0usize; n];
        for j in 1..=m {
            if task_owner[j] > 0 {
                worker_to_task[task_owner[j] - 1] = j - 1;
            }
        }

        let total_cost = worker_to_task
            .iter()
            .enumerate()
            .map(|(i, &j)| matrix.cost(i, j))
            .sum::<f64>();
        // Free tasks were never reached by a search, so their potentials are still zero
        let dual_objective = u[1..].iter().sum::<f64>() + v[1..].iter().sum::<f64>();
        debug!(total_cost, dual_objective, "assignment solved");

        Ok(Assignment {
            worker_to_task,
            total_cost,
            dual_objective,
        })
    }
}

/// Formulate the assignment as a linear program.
///
/// One variable `worker_{i}_task_{j}` in [0, 1] per pair, minimizing total
/// cost. The larger side is matched at most once and the smaller side exactly
/// once, so this works for either orientation of the matrix.
pub fn to_problem(matrix: &CostMatrix) -> Result<Problem, ProblemError> {
    let n = matrix.num_workers();
    let m = matrix.num_tasks();
    let mut problem = Problem::new("assignment");

    let mut vars = Vec::with_capacity(n * m);
    for i in 0..n {
        for j in 0..m {
            let var = problem.add_variable(format!("worker_{}_task_{}", i, j), 0.0, 1.0)?;
            problem.set_objective_coefficient(var, matrix.cost(i, j))?;
            vars.push(var);
        }
    }

    let (worker_lower, task_lower) = if n <= m { (1.0, 0.0) } else { (0.0, 1.0) };

    // Each worker is assigned to at most (or exactly) one task
    for i in 0..n {
        let row = problem.add_constraint(format!("worker_{}", i), worker_lower, 1.0)?;
        for j in 0..m {
            problem.set_coefficient(row, vars[i * m + j], 1.0)?;
        }
    }

    // Each task is assigned to exactly (or at most) one worker
    for j in 0..m {
        let row = problem.add_constraint(format!("task_{}", j), task_lower, 1.0)?;
        for i in 0..n {
            problem.set_coefficient(row, vars[i * m + j], 1.0)?;
        }
    }

    problem.minimize();
    Ok(problem)
}
