pub mod aggregate;
pub mod cache;
pub mod category;
pub mod colors;
pub mod config;
pub mod dataset;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod rank;
pub mod report;
pub mod trend;

use std::path::Path;

use cache::DatasetLoader;
use config::QueryParams;
use dataset::LoadError;
use pipeline::Engine;
use report::Dashboard;

/// Compute a dashboard from `loader`'s snapshot.
///
/// The snapshot is parsed on the first call and reused by every later call
/// on the same loader.
pub fn analyze(loader: &DatasetLoader, params: &QueryParams) -> Result<Dashboard, LoadError> {
    let snapshot = loader.load()?;
    Ok(Engine::from_snapshot(&snapshot).run(params))
}

/// One-shot helper: load the dataset at `path` and compute a single
/// dashboard. Nothing is cached between calls; hold a [`DatasetLoader`] and
/// use [`analyze`] to query the same file repeatedly.
pub fn analyze_file(path: &Path, params: &QueryParams) -> Result<Dashboard, LoadError> {
    analyze(&DatasetLoader::from_path(path), params)
}
