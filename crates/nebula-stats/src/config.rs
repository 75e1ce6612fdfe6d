use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::args::SourceArgs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    File(PathBuf),
    Gateway { model_id: String },
}

pub fn build_source(args: SourceArgs) -> Result<SnapshotSource> {
    match (args.file, args.model) {
        (Some(path), None) => Ok(SnapshotSource::File(path)),
        (None, Some(model_id)) if !model_id.is_empty() => Ok(SnapshotSource::Gateway { model_id }),
        (None, Some(_)) => bail!("--model must not be empty"),
        (Some(_), Some(_)) => bail!("pass either --file or --model, not both"),
        (None, None) => bail!("a snapshot source is required: --file <path> or --model <model_id>"),
    }
}
