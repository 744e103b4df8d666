//! Column selection: project the table onto the chosen columns.

use crate::dataset::Dataset;
use crate::error::ConvertError;
use std::collections::HashSet;
use tracing::debug;

/// Keep `selection` in the given order, or every column when `None`.
///
/// Row count and row order are never changed.
pub fn select_columns(ds: Dataset, selection: Option<&[String]>) -> Result<Dataset, ConvertError> {
    let Some(names) = selection else {
        return Ok(ds);
    };
    if names.is_empty() {
        return Err(ConvertError::NoColumnsSelected);
    }

    let mut seen = HashSet::with_capacity(names.len());
    let mut indices = Vec::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ConvertError::DuplicateColumn { name: name.clone() });
        }
        let index = ds
            .column_index(name)
            .ok_or_else(|| ConvertError::UnknownColumn {
                name: name.clone(),
                available: ds.column_names().join(", "),
            })?;
        indices.push(index);
    }

    debug!("Selecting {} of {} columns", indices.len(), ds.column_count());
    Ok(ds.take_columns(&indices))
}
