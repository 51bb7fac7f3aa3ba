mod model;

use clap::{Parser, Subcommand, ValueEnum};
use orkit_solver::{Assignment, AssignmentSolver, CostMatrix, Problem, Solution, SolutionStatus, Solver};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "orkit")]
#[command(about = "Solve linear programs and assignment problems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Simplex iteration cap (derived from the problem size by default)
    #[arg(long, global = true)]
    max_iterations: Option<usize>,
    /// Tolerance for floating point comparisons
    #[arg(long, global = true, default_value_t = 1e-9)]
    tolerance: f64,
    /// Report the current point as FEASIBLE instead of ABNORMAL when the cap is hit after phase 1
    #[arg(long, global = true)]
    feasible_on_limit: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a linear program described in a JSON model file
    Solve {
        /// The model file
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Show detailed analysis
        #[arg(short, long)]
        analysis: bool,
    },
    /// Solve an assignment problem from a JSON cost matrix (rows are workers)
    Assign {
        /// The cost matrix file
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Run the built-in linear and assignment examples
    Demo,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut solver = Solver::new()
        .with_tolerance(cli.tolerance)
        .with_feasible_on_limit(cli.feasible_on_limit);
    if let Some(max) = cli.max_iterations {
        solver = solver.with_max_iterations(max);
    }

    match cli.command {
        Commands::Solve { file, format, analysis } => {
            let problem = match model::Model::load(&file).and_then(|m| m.compile()) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Model error in {}: {}", file.display(), e);
                    std::process::exit(1);
                }
            };

            let solution = solver.solve(&problem);

            match format {
                Format::Json => print_json(&solution),
                Format::Pretty => print_solution(&problem, &solution, analysis),
            }
            if !solution.status.has_values() {
                std::process::exit(1);
            }
        }
        Commands::Assign { file, format } => {
            let matrix = match model::load_costs(&file) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Cost matrix error in {}: {}", file.display(), e);
                    std::process::exit(1);
                }
            };

            let report = match solve_assignment(&matrix) {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("Assignment error: {}", e);
                    std::process::exit(1);
                }
            };

            match format {
                Format::Json => print_json(&report),
                Format::Pretty => print_assignment(&matrix, &report),
            }
        }
        Commands::Demo => run_demo(&solver),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }
}

/// An assignment in the orientation of the input file
#[derive(Debug, PartialEq, serde::Serialize)]
struct AssignmentReport {
    /// Index i gives the task of worker i; `None` for idle workers
    worker_to_task: Vec<Option<usize>>,
    /// `(worker, task)` pairs in worker order
    pairs: Vec<(usize, usize)>,
    total_cost: f64,
    dual_objective: f64,
    /// Whether the matrix was solved with tasks in the row role
    transposed: bool,
}

impl AssignmentReport {
    fn new(num_workers: usize, assignment: &Assignment, transposed: bool) -> Self {
        let mut worker_to_task = vec![None; num_workers];
        for (row, col) in assignment.pairs() {
            let (worker, task) = if transposed { (col, row) } else { (row, col) };
            worker_to_task[worker] = Some(task);
        }
        let pairs = worker_to_task
            .iter()
            .enumerate()
            .filter_map(|(worker, task)| task.map(|task| (worker, task)))
            .collect();
        Self {
            worker_to_task,
            pairs,
            total_cost: assignment.total_cost,
            dual_objective: assignment.dual_objective,
            transposed,
        }
    }
}

/// Tasks must each go to exactly one worker, so a tall matrix is solved with
/// tasks in the row role and mapped back.
fn solve_assignment(matrix: &CostMatrix) -> Result<AssignmentReport, orkit_solver::AssignmentError> {
    let solver = AssignmentSolver::new();
    if matrix.num_workers() > matrix.num_tasks() {
        tracing::info!(
            workers = matrix.num_workers(),
            tasks = matrix.num_tasks(),
            "more workers than tasks, solving transposed"
        );
        let by_task = solver.solve(&matrix.transposed())?;
        Ok(AssignmentReport::new(matrix.num_workers(), &by_task, true))
    } else {
        let by_worker = solver.solve(matrix)?;
        Ok(AssignmentReport::new(matrix.num_workers(), &by_worker, false))
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
    );
}

fn print_solution(problem: &Problem, solution: &Solution, analysis: bool) {
    println!("Problem: {}", problem.name);
    println!();

    match solution.status {
        SolutionStatus::Optimal | SolutionStatus::Feasible => {
            let label = if solution.status == SolutionStatus::Optimal { "OPTIMAL" } else { "FEASIBLE" };
            println!("Status: {}", label);
            println!("Objective value = {}", solution.objective_value);
            println!("Iterations: {}", solution.iterations);
            println!();
            println!("Variables:");
            for (var, value) in problem.variables().iter().zip(&solution.values) {
                println!("  {:20} {:12.6}", var.name, value);
            }

            if analysis {
                println!();
                println!("Analysis:");
                println!();

                if !solution.analysis.binding_constraints.is_empty() {
                    println!("Binding constraints:");
                    for name in &solution.analysis.binding_constraints {
                        println!("  - {}", name);
                    }
                    println!();
                }

                println!("Shadow prices:");
                for sp in &solution.analysis.shadow_prices {
                    println!("  {:30} activity {:12.6}  price {:12.6}", sp.constraint, sp.activity, sp.value);
                }
                println!();

                println!("Reduced costs (non-basic variables):");
                for rc in &solution.analysis.reduced_costs {
                    if !rc.is_basic {
                        println!("  {:20} {:12.6}", rc.variable, rc.reduced_cost);
                    }
                }
            }
        }
        SolutionStatus::Infeasible => {
            println!("Status: INFEASIBLE");
            println!("No solution exists that satisfies all constraints.");
            if !solution.violations.is_empty() {
                println!();
                println!("Closest point still violates:");
                for v in &solution.violations {
                    println!("  - {}", v.description);
                }
            }
        }
        SolutionStatus::Unbounded => {
            println!("Status: UNBOUNDED");
            println!("The problem has no finite optimal solution.");
        }
        SolutionStatus::Abnormal => {
            println!("Status: ABNORMAL");
            println!("Solver stopped after {} iterations without an answer.", solution.iterations);
        }
    }
}

fn print_assignment(matrix: &CostMatrix, report: &AssignmentReport) {
    println!("Total cost: {}", report.total_cost);
    println!();
    for &(worker, task) in &report.pairs {
        println!("Worker {} assigned to task {}. Cost: {}", worker, task, matrix.cost(worker, task));
    }
}

fn run_demo(solver: &Solver) {
    println!("== Linear program");
    match demo_linear() {
        Ok(problem) => {
            let solution = solver.solve(&problem);
            print_solution(&problem, &solution, false);
        }
        Err(e) => eprintln!("Failed to build linear example: {}", e),
    }
    println!();

    println!("== Assignment (5 workers, 4 tasks)");
    let matrix = CostMatrix::new(vec![
        vec![90.0, 80.0, 75.0, 70.0],
        vec![35.0, 85.0, 55.0, 65.0],
        vec![125.0, 95.0, 90.0, 95.0],
        vec![45.0, 110.0, 95.0, 115.0],
        vec![50.0, 100.0, 90.0, 100.0],
    ]);
    match matrix.and_then(|m| solve_assignment(&m).map(|report| (m, report))) {
        Ok((matrix, report)) => print_assignment(&matrix, &report),
        Err(e) => {
            println!("No solution found.");
            eprintln!("{}", e);
        }
    }
}

/// x in [0, 1], y in [0, 2], 0 <= x + y <= 4, maximize 3x + y
fn demo_linear() -> Result<Problem, orkit_solver::ProblemError> {
    let mut problem = Problem::new("linear");
    let x = problem.add_variable("x", 0.0, 1.0)?;
    let y = problem.add_variable("y", 0.0, 2.0)?;

    let ct = problem.add_constraint("ct", 0.0, 4.0)?;
    problem.set_coefficient(ct, x, 1.0)?;
    problem.set_coefficient(ct, y, 1.0)?;

    problem.set_objective_coefficient(x, 3.0)?;
    problem.set_objective_coefficient(y, 1.0)?;
    problem.maximize();
    Ok(problem)
}
