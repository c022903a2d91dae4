use crate::api::CatalogSource;
use crate::error::CatalogError;
use crate::service::artifact::{JsonStyle, write_json_atomic};
use crate::types::catalog::Envelope;
use std::path::Path;
use tracing::info;

/// Fetch the full make list and store it at `path` in the provider's own
/// envelope, ready to be consumed by the sync step.
pub async fn fetch_make_list<S: CatalogSource>(
    source: &S,
    path: &Path,
) -> Result<usize, CatalogError> {
    let makes = source.list_makes().await?;
    write_json_atomic(path, &Envelope::from_makes(&makes), JsonStyle::Indented(2))?;
    info!(path = %path.display(), count = makes.len(), "wrote make list");
    Ok(makes.len())
}
