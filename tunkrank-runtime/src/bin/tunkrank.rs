use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tunkrank_api::graph::PGraph;
use tunkrank_common::config::{keys, Configuration};
use tunkrank_runtime::io::generator::{PowerLawSpec, DEFAULT_ALPHA, DEFAULT_TRUNCATE};
use tunkrank_runtime::io::loader::GraphFormat;
use tunkrank_runtime::job::TunkRankJob;
use tunkrank_runtime::observability::{init_prometheus, init_tracing};
use tunkrank_runtime::plan::job_spec::{GraphSource, JobSpec};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum EngineArg {
    Synchronous,
    Asynchronous,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum FormatArg {
    Tsv,
    Csv,
    Snap,
    Adj,
}

impl From<FormatArg> for GraphFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Tsv => GraphFormat::Tsv,
            FormatArg::Csv => GraphFormat::Csv,
            FormatArg::Snap => GraphFormat::Snap,
            FormatArg::Adj => GraphFormat::Adj,
        }
    }
}

/// Computes TunkRank influence over a follows graph.
#[derive(Debug, Parser)]
#[command(name = "tunkrank")]
struct Args {
    /// Graph file or directory of graph files.
    #[arg(value_name = "GRAPH")]
    graph: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FormatArg::Adj)]
    format: FormatArg,

    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Largest change in influence that still counts as converged.
    #[arg(long)]
    tol: Option<f64>,

    #[arg(long)]
    retweet_prob: Option<f64>,

    /// Run exactly this many supersteps on the synchronous engine.
    #[arg(long)]
    iterations: Option<u64>,

    /// Generate a synthetic powerlaw out-degree graph with this many vertices.
    #[arg(long, default_value_t = 0)]
    powerlaw: usize,

    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    powerlaw_alpha: f64,

    #[arg(long, default_value_t = DEFAULT_TRUNCATE)]
    powerlaw_truncate: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Save results to `<saveprefix>_<i>_of_<n>`.
    #[arg(long)]
    saveprefix: Option<String>,

    #[arg(long)]
    partitions: Option<usize>,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    max_iterations: Option<u64>,

    /// JSON job file; replaces every other graph and engine flag.
    #[arg(long)]
    job: Option<PathBuf>,

    /// Extra `key=value` settings, applied last.
    #[arg(long = "conf", value_name = "KEY=VALUE")]
    conf: Vec<String>,

    #[arg(long)]
    metrics_listen: Option<SocketAddr>,
}

fn to_configuration(args: &Args) -> anyhow::Result<Configuration> {
    let mut conf = Configuration::new();
    if let Some(engine) = args.engine {
        let name = match engine {
            EngineArg::Synchronous => "synchronous",
            EngineArg::Asynchronous => "asynchronous",
        };
        conf.put(keys::ENGINE, name);
    }
    if let Some(tol) = args.tol {
        conf.put(keys::TOLERANCE, tol.to_string());
    }
    if let Some(p) = args.retweet_prob {
        conf.put(keys::RETWEET_PROBABILITY, p.to_string());
    }
    if let Some(n) = args.iterations {
        conf.put(keys::FIXED_ITERATIONS, n.to_string());
    }
    if let Some(prefix) = &args.saveprefix {
        conf.put(keys::SAVE_PREFIX, prefix.clone());
    }
    if let Some(p) = args.partitions {
        conf.put(keys::GRAPH_PARTITIONS, p.to_string());
    }
    if let Some(t) = args.threads {
        conf.put(keys::ENGINE_THREADS, t.to_string());
    }
    if let Some(m) = args.max_iterations {
        conf.put(keys::ENGINE_MAX_ITERATIONS, m.to_string());
    }
    for pair in &args.conf {
        conf.put_pair(pair)?;
    }
    Ok(conf)
}

fn graph_source(args: &Args) -> Option<GraphSource> {
    if args.powerlaw > 0 {
        return Some(GraphSource::PowerLaw(PowerLawSpec {
            vertices: args.powerlaw,
            alpha: args.powerlaw_alpha,
            truncate: args.powerlaw_truncate,
            seed: args.seed,
            in_degree: false,
        }));
    }
    args.graph.as_ref().map(|path| GraphSource::File {
        path: path.display().to_string(),
        format: args.format.into(),
    })
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    if let Some(addr) = args.metrics_listen {
        init_prometheus(addr)?;
        info!(%addr, "prometheus exporter listening");
    }

    let spec = match &args.job {
        Some(path) => JobSpec::from_json_file(path)?,
        None => {
            let conf = to_configuration(&args)?;
            JobSpec::from_configuration("tunkrank", graph_source(&args), &conf)?
        }
    };
    let job = TunkRankJob::from_spec(&spec)?;
    let result = job.execute()?;

    info!(
        vertices = result.graph.num_vertices(),
        files = result.output_files.len(),
        seconds = result.summary.elapsed_seconds(),
        "done"
    );
    Ok(())
}
