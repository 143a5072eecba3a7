use std::path::PathBuf;
use std::process::ExitCode;

use fem_io::{
    ErrorSummary, ManufacturedSolution, MeshSummary, ProblemFile, RunReport, load_problem,
    save_report, write_dense_matrix, write_nodal_table,
};
use fem_solver::FemSolver;
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("usage: fem-cli solve <problem.json> [--out <dir>] [--solution <name>] [--dump-matrix] [--json]");
    eprintln!("       fem-cli mesh-info <problem.json>");
}

struct SolveArgs {
    problem: PathBuf,
    out: Option<PathBuf>,
    solution: Option<ManufacturedSolution>,
    dump_matrix: bool,
    json: bool,
}

fn parse_solve_args(args: &[String]) -> Result<SolveArgs, String> {
    let mut iter = args.iter();
    let problem = iter
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| "missing problem file".to_string())?;
    let mut parsed = SolveArgs {
        problem,
        out: None,
        solution: None,
        dump_matrix: false,
        json: false,
    };
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => {
                let dir = iter.next().ok_or("--out needs a directory")?;
                parsed.out = Some(PathBuf::from(dir));
            }
            "--solution" => {
                let name = iter.next().ok_or("--solution needs a name")?;
                parsed.solution = Some(name.parse().map_err(|err| format!("{err}"))?);
            }
            "--dump-matrix" => parsed.dump_matrix = true,
            "--json" => parsed.json = true,
            other => return Err(format!("unknown option: {other}")),
        }
    }
    Ok(parsed)
}

fn run_solve(args: &SolveArgs) -> fem_io::Result<()> {
    let mut problem: ProblemFile = load_problem(&args.problem)?;
    if let Some(solution) = args.solution {
        problem.solution = solution;
    }
    let (structured, nodes) = problem.build()?;
    let mesh = &structured.mesh;

    let solver = FemSolver::new(mesh, &problem.solution, problem.fem_config(), nodes);
    let field = solver.compute()?;
    let error = field.error()?;
    let integral = field.integrate()?;
    let info = field.solve_info();

    println!("nodes: {}", mesh.num_nodes());
    println!("elements: {}", mesh.num_elements());
    println!("solver: {}", info.solver_name);
    println!("iterations: {}", info.iterations);
    println!("status: {:?}", info.status);
    println!("residual_ratio: {:e}", info.residual_ratio);
    println!("max_error: {:e}", error.max);
    println!("error_integral: {:e}", integral);

    let report = RunReport::new(
        problem.solution.name(),
        MeshSummary::from(&mesh.statistics()),
        info.clone(),
        ErrorSummary::new(&error, Some(integral)),
    )
    .with_metadata("problem_file", args.problem.display().to_string())
    .with_metadata("basis", format!("{:?}", field.basis()).to_lowercase());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if let Some(dir) = &args.out {
        write_nodal_table(dir.join("nodes.txt"), mesh, field.values(), &problem.solution)?;
        save_report(dir.join("report.json"), &report)?;
        if args.dump_matrix {
            let system = solver.assemble()?;
            write_dense_matrix(dir.join("matrix.txt"), &system.matrix)?;
        }
        tracing::info!(dir = %dir.display(), "results written");
    } else if args.dump_matrix {
        tracing::warn!("--dump-matrix ignored without --out");
    }
    Ok(())
}

fn run_mesh_info(path: &str) -> fem_io::Result<()> {
    let problem = load_problem(path)?;
    let (structured, nodes) = problem.build()?;
    println!("{}", structured.mesh.statistics().format());
    println!("dirichlet_nodes: {}", nodes.len());
    println!("periodic: {}", structured.layout.periodic);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
        return ExitCode::from(2);
    }

    let result = match args[1].as_str() {
        "solve" => match parse_solve_args(&args[2..]) {
            Ok(solve_args) => run_solve(&solve_args),
            Err(msg) => {
                eprintln!("{msg}");
                usage();
                return ExitCode::from(2);
            }
        },
        "mesh-info" if args.len() == 3 => run_mesh_info(&args[2]),
        _ => {
            usage();
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}
