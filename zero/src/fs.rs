use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use evm_tracer::Conflation;

/// Reads a JSON conflation dump, naming the offending field on failure.
pub fn read_conflation(path: &Path) -> anyhow::Result<Conflation> {
    let file =
        File::open(path).with_context(|| format!("cannot open conflation {}", path.display()))?;
    let des = &mut serde_json::Deserializer::from_reader(BufReader::new(file));
    let conflation: Conflation = serde_path_to_error::deserialize(des)
        .with_context(|| format!("malformed conflation {}", path.display()))?;
    tracing::info!(
        "read {} execution events from {}",
        conflation.events.len(),
        path.display()
    );
    Ok(conflation)
}
