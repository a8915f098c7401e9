use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tunkrank_common::error::{TunkRankError, TunkRankResult};
use tunkrank_common::types::{Edge, VertexId};

use crate::graph::builder::GraphBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// `src target`, separated by tabs or spaces.
    Tsv,
    Csv,
    /// SNAP edge lists: whitespace separated, `#` comments.
    Snap,
    /// `id n t1 ... tn`
    Adj,
}

impl FromStr for GraphFormat {
    type Err = TunkRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tsv" => Ok(GraphFormat::Tsv),
            "csv" => Ok(GraphFormat::Csv),
            "snap" => Ok(GraphFormat::Snap),
            "adj" => Ok(GraphFormat::Adj),
            other => Err(TunkRankError::Config(format!(
                "unknown graph format '{other}', expected one of tsv, csv, snap, adj"
            ))),
        }
    }
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphFormat::Tsv => "tsv",
            GraphFormat::Csv => "csv",
            GraphFormat::Snap => "snap",
            GraphFormat::Adj => "adj",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub files: usize,
    pub edges: usize,
}

#[derive(Debug, Default)]
struct ParsedFile {
    vertices: Vec<VertexId>,
    edges: Vec<Edge<VertexId>>,
}

/// A directory is read file by file in sorted order, skipping hidden files.
/// A file that fails to parse leaves `builder` untouched by that file.
pub fn load_graph<VV>(
    builder: &mut GraphBuilder<VV>,
    path: impl AsRef<Path>,
    format: GraphFormat,
) -> TunkRankResult<LoadStats>
where
    VV: Copy + Send + Sync + 'static,
{
    let files = list_graph_files(path.as_ref())?;
    if files.is_empty() {
        return Err(TunkRankError::InvalidArgument(format!(
            "no graph files found at {}",
            path.as_ref().display()
        )));
    }

    let mut stats = LoadStats::default();
    for file in &files {
        let parsed = parse_file(file, format)?;
        let edges = parsed.edges.len();
        for id in parsed.vertices {
            builder.declare_vertex(id);
        }
        builder.add_edges(parsed.edges);
        debug!(file = %file.display(), edges, "loaded graph file");
        stats.files += 1;
        stats.edges += edges;
    }
    info!(
        files = stats.files,
        edges = stats.edges,
        %format,
        "graph loaded"
    );
    Ok(stats)
}

pub fn list_graph_files(path: &Path) -> TunkRankResult<Vec<PathBuf>> {
    fn walk(acc: &mut Vec<PathBuf>, p: &Path) -> TunkRankResult<()> {
        for entry in std::fs::read_dir(p)? {
            let entry = entry?;
            let path = entry.path();
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden {
                continue;
            }
            let meta = entry.metadata()?;
            if meta.is_dir() {
                walk(acc, &path)?;
            } else if meta.is_file() {
                acc.push(path);
            }
        }
        Ok(())
    }

    let meta = std::fs::metadata(path)?;
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut out = Vec::new();
    walk(&mut out, path)?;
    out.sort();
    Ok(out)
}

fn parse_file(path: &Path, format: GraphFormat) -> TunkRankResult<ParsedFile> {
    match format {
        GraphFormat::Tsv | GraphFormat::Snap => parse_pairs(path),
        GraphFormat::Csv => parse_csv(path),
        GraphFormat::Adj => parse_adj(path),
    }
}

fn parse_error(path: &Path, line: usize, message: String) -> TunkRankError {
    TunkRankError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    }
}

fn parse_id(raw: &str, what: &str, path: &Path, line: usize) -> TunkRankResult<VertexId> {
    raw.trim()
        .parse()
        .map_err(|e| parse_error(path, line, format!("{what} '{}': {e}", raw.trim())))
}

fn parse_csv(path: &Path) -> TunkRankResult<ParsedFile> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| TunkRankError::Io(e.into()))?;

    let mut out = ParsedFile::default();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
            parse_error(path, line, format!("csv read: {e}"))
        })?;
        let line = rec.position().map(|p| p.line() as usize).unwrap_or(0);
        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if rec.len() < 2 {
            return Err(parse_error(
                path,
                line,
                format!("expected 2 fields, found {}", rec.len()),
            ));
        }
        let src = parse_id(&rec[0], "edge source", path, line)?;
        let target = parse_id(&rec[1], "edge target", path, line)?;
        out.edges.push(Edge::new(src, target));
    }
    Ok(out)
}

fn parse_pairs(path: &Path) -> TunkRankResult<ParsedFile> {
    let reader = BufReader::new(File::open(path)?);
    let mut out = ParsedFile::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let mut parts = s.split_whitespace();
        let (Some(src), Some(target)) = (parts.next(), parts.next()) else {
            return Err(parse_error(path, lineno, "expected 'source target'".to_string()));
        };
        let src = parse_id(src, "edge source", path, lineno)?;
        let target = parse_id(target, "edge target", path, lineno)?;
        out.edges.push(Edge::new(src, target));
    }
    Ok(out)
}

fn parse_adj(path: &Path) -> TunkRankResult<ParsedFile> {
    let reader = BufReader::new(File::open(path)?);
    let mut out = ParsedFile::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(parse_error(
                path,
                lineno,
                "expected 'id count targets...'".to_string(),
            ));
        }
        let src = parse_id(fields[0], "vertex id", path, lineno)?;
        let count: usize = fields[1].parse().map_err(|e| {
            parse_error(path, lineno, format!("neighbour count '{}': {e}", fields[1]))
        })?;
        if fields.len() != count + 2 {
            return Err(parse_error(
                path,
                lineno,
                format!("declared {count} neighbours but found {}", fields.len() - 2),
            ));
        }
        out.vertices.push(src);
        for raw in &fields[2..] {
            let target = parse_id(raw, "neighbour id", path, lineno)?;
            out.edges.push(Edge::new(src, target));
        }
    }
    Ok(out)
}
