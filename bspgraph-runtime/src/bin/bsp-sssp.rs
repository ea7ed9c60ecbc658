use bspgraph_runtime::io::{
    AdjacencyFormat, DuplicateVertexPolicy, EdgeListFormat, InputFormat, UnknownDestinationPolicy,
};
use bspgraph_runtime::job::SsspJob;
use bspgraph_runtime::observability::{init_prometheus, init_tracing};
use bspgraph_runtime::plan::execution_plan::ExecutionPlan;
use bspgraph_runtime::plan::job_spec::{ExecutionSpec, GraphSpec, JobSpec};
use bspgraph_runtime::scheduler::superstep_coordinator::NonConvergencePolicy;
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Format {
    Adjacency,
    EdgeList,
}

#[derive(Debug, Parser)]
#[command(about = "Single source shortest path on a bulk synchronous parallel engine")]
struct Args {
    /// JSON job spec; the graph and execution flags are ignored when set.
    #[arg(long)]
    job: Option<PathBuf>,

    #[arg(long, value_delimiter = ',')]
    input: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Adjacency)]
    format: Format,

    #[arg(long)]
    delimiter: Option<char>,

    #[arg(long, default_value_t = 1)]
    adjacency_column: usize,

    #[arg(long, default_value_t = 0)]
    skip_header_lines: usize,

    #[arg(long)]
    symmetric: bool,

    #[arg(long)]
    allow_duplicate_vertices: bool,

    #[arg(long)]
    reject_unknown_destinations: bool,

    #[arg(long, default_value_t = 0)]
    start_vertex: u64,

    #[arg(long, default_value_t = 2)]
    partitions: usize,

    #[arg(long)]
    parallelism: Option<usize>,

    #[arg(long)]
    max_supersteps: Option<u64>,

    #[arg(long)]
    allow_partial: bool,

    #[arg(long)]
    output: Option<String>,

    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    metrics_listen: Option<SocketAddr>,
}

fn input_format(args: &Args) -> InputFormat {
    match args.format {
        Format::Adjacency => InputFormat::Adjacency(AdjacencyFormat {
            delimiter: args.delimiter.unwrap_or('\t'),
            adjacency_column: args.adjacency_column,
            symmetric: args.symmetric,
            duplicate_vertices: if args.allow_duplicate_vertices {
                DuplicateVertexPolicy::LastWriteWins
            } else {
                DuplicateVertexPolicy::Reject
            },
            unknown_destinations: if args.reject_unknown_destinations {
                UnknownDestinationPolicy::Reject
            } else {
                UnknownDestinationPolicy::CreateStub
            },
            ..AdjacencyFormat::default()
        }),
        Format::EdgeList => InputFormat::EdgeList(EdgeListFormat {
            delimiter: args.delimiter.unwrap_or(' '),
            skip_header_lines: args.skip_header_lines,
            symmetric: args.symmetric,
        }),
    }
}

fn build_job_spec(args: &Args) -> Result<JobSpec, Box<dyn std::error::Error>> {
    if let Some(path) = &args.job {
        return Ok(JobSpec::from_json_path(path)?);
    }
    let spec = JobSpec {
        name: "Single Source Shortest Path".to_string(),
        start_vertex: args.start_vertex,
        graph: GraphSpec {
            inputs: args.input.clone(),
            format: input_format(args),
        },
        execution: ExecutionSpec {
            partitions: args.partitions,
            parallelism: args.parallelism,
            max_supersteps: args.max_supersteps.unwrap_or(u64::MAX),
            non_convergence: if args.allow_partial {
                NonConvergencePolicy::ReturnPartial
            } else {
                NonConvergencePolicy::Fail
            },
            combine_messages: true,
        },
        output_dir: args.output.clone(),
    };
    spec.validate()?;
    Ok(spec)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing();
    if let Some(addr) = args.metrics_listen {
        init_prometheus(addr)?;
    }

    let spec = build_job_spec(&args)?;
    if args.dry_run {
        let plan = ExecutionPlan::from_job_spec(&spec);
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping before the next superstep");
            on_signal.cancel();
        }
    });

    let job = SsspJob::new(spec)?;
    let result = tokio::task::spawn_blocking(move || job.run(cancel)).await??;

    println!(
        "supersteps={} converged={} vertices={} messages={}",
        result.summary.supersteps,
        result.summary.converged,
        result.vertices.len(),
        result.summary.total_messages()
    );
    for path in &result.output_files {
        println!("{}", path.display());
    }
    Ok(())
}
