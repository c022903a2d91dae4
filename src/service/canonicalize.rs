use crate::error::CatalogError;
use crate::service::artifact::{JsonStyle, read_json, write_json_atomic};
use crate::types::export::ExportDocument;
use std::path::Path;
use tracing::info;

/// Reorder makes, and each make's models, by case-insensitive name.
///
/// Sorting is stable, so records whose names differ only in case keep their
/// relative order and a second pass is a no-op.
pub fn canonicalize(mut doc: ExportDocument) -> ExportDocument {
    for make in &mut doc.makes {
        make.models.sort_by_cached_key(|m| m.name.to_lowercase());
    }
    doc.makes.sort_by_cached_key(|m| m.name.to_lowercase());
    doc
}

/// Read the artifact at `path`, canonicalize it and replace it in place.
pub fn canonicalize_file(path: &Path) -> Result<ExportDocument, CatalogError> {
    let doc: ExportDocument = read_json(path)?;
    let doc = canonicalize(doc);
    write_json_atomic(path, &doc, JsonStyle::Indented(4))?;
    info!(path = %path.display(), makes = doc.makes.len(), "canonicalized catalog");
    Ok(doc)
}
