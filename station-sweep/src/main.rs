use std::path::PathBuf;
use std::process::ExitCode;

use station_sweep::feed::load_network;
use station_sweep::graph::{BuildOptions, build_graph, synthesize_source};
use station_sweep::planner::{
    BestPathFile, CoverageSearch, NullObserver, SearchOptions, Termination,
};
use station_sweep::report::path_report;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (timetable, transfers, best_path) = match args.as_slice() {
        [timetable, transfers] => (PathBuf::from(timetable), PathBuf::from(transfers), None),
        [timetable, transfers, best_path] => (
            PathBuf::from(timetable),
            PathBuf::from(transfers),
            Some(PathBuf::from(best_path)),
        ),
        _ => {
            eprintln!("usage: station-sweep <timetable.json> <transfers.json> [best-path.json]");
            return ExitCode::from(2);
        }
    };

    match run(&timetable, &transfers, best_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    timetable: &std::path::Path,
    transfers: &std::path::Path,
    best_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let network = load_network(timetable, transfers)?;
    println!("Loaded {} lines", network.lines.len());

    let (mut graph, mut canon) =
        build_graph(&network.lines, &network.rules, &BuildOptions::default())?;
    println!(
        "Built graph: {} nodes, {} edges, {} stations",
        graph.len(),
        graph.edge_count(),
        canon.count()
    );

    let source = synthesize_source(&mut graph, &mut canon);
    let options = SearchOptions::default();
    let search = CoverageSearch::new(&graph, &canon, &options);

    let outcome = match best_path {
        Some(path) => {
            let mut observer = BestPathFile::new(&path);
            let outcome = search.run(source, &mut observer)?;
            if let Some(err) = observer.last_error() {
                eprintln!("warning: {err}");
            } else {
                println!("Best path saved to {}", path.display());
            }
            outcome
        }
        None => search.run(source, &mut NullObserver)?,
    };

    println!();
    print!("{}", path_report(&graph, &outcome.best.nodes));
    println!();
    let why = match outcome.termination {
        Termination::FullCoverage => "every station covered",
        Termination::Exhausted => "search space exhausted",
        Termination::IterationLimit => "iteration limit",
        Termination::TimeLimit => "time limit",
    };
    println!(
        "Covered {} of {} stations in {:.0} minutes over {} stops ({}; {} states examined)",
        outcome.best.covered,
        canon.count(),
        outcome.best.elapsed,
        outcome.best.nodes.len(),
        why,
        outcome.iterations
    );

    Ok(())
}
