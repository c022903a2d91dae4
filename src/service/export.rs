use crate::db::CatalogStorage;
use crate::error::CatalogError;
use crate::service::artifact::{JsonStyle, write_json_atomic};
use crate::types::export::ExportDocument;
use std::path::Path;
use tracing::info;

/// Read every make (by name) with its models (by name) into one document.
/// Read-only with respect to the store.
pub async fn export(store: &CatalogStorage) -> Result<ExportDocument, CatalogError> {
    let makes = store.all_makes_ordered_by_name().await?;
    let mut exported = Vec::with_capacity(makes.len());
    for make in makes {
        let models = store.models_for_make(make.id).await?;
        exported.push(make.into_export(models));
    }
    Ok(ExportDocument::new(exported))
}

/// Export the store and write the minified artifact to `path`. Nothing is
/// written unless the whole document was read.
pub async fn export_to_file(
    store: &CatalogStorage,
    path: &Path,
) -> Result<ExportDocument, CatalogError> {
    let doc = export(store).await?;
    write_json_atomic(path, &doc, JsonStyle::Compact)?;
    info!(
        path = %path.display(),
        makes = doc.makes.len(),
        models = doc.model_count(),
        "exported catalog"
    );
    Ok(doc)
}
