use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tunkrank_common::error::{TunkRankError, TunkRankResult};

use crate::graph::partitioned_graph::{GraphPartition, PartitionedGraph};

/// `<prefix>_<index+1>_of_<total>`
pub fn shard_path(prefix: &str, index: usize, total: usize) -> PathBuf {
    PathBuf::from(format!("{prefix}_{}_of_{total}", index + 1))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_shard(part: &GraphPartition<f64>, path: &Path) -> TunkRankResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)
        .map_err(|e| TunkRankError::Io(e.into()))?;
    for local in 0..part.len() {
        wtr.write_record([part.id(local).to_string(), part.value(local).to_string()])
            .map_err(|e| TunkRankError::Io(e.into()))?;
    }
    wtr.flush()?;
    Ok(())
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "failed to remove staged shard");
        }
    }
}

/// One `id<TAB>influence` line per vertex, one file per partition. Shards are
/// staged under a `.tmp` name and only renamed once all of them are written,
/// so a failed save leaves no partial output behind.
pub fn save_partitioned(
    graph: &PartitionedGraph<f64>,
    prefix: &str,
) -> TunkRankResult<Vec<PathBuf>> {
    if prefix.is_empty() {
        return Err(TunkRankError::InvalidArgument(
            "save prefix must not be empty".to_string(),
        ));
    }
    if let Some(parent) = Path::new(prefix).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let total = graph.num_partitions();
    let mut staged = Vec::with_capacity(total);
    let mut lines = 0usize;
    for (index, part) in graph.partitions().iter().enumerate() {
        let tmp = staging_path(&shard_path(prefix, index, total));
        if let Err(e) = write_shard(part, &tmp) {
            if tmp.is_file() {
                staged.push(tmp);
            }
            discard(&staged);
            return Err(e);
        }
        staged.push(tmp);
        lines += part.len();
    }

    let mut paths = Vec::with_capacity(total);
    for (index, tmp) in staged.iter().enumerate() {
        let path = shard_path(prefix, index, total);
        if let Err(e) = std::fs::rename(tmp, &path) {
            discard(&paths);
            discard(&staged[index..]);
            return Err(e.into());
        }
        paths.push(path);
    }
    info!(files = paths.len(), lines, prefix, "saved influence values");
    Ok(paths)
}
