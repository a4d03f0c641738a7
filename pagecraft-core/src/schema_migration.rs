//! Batch job that gives every component schema the standard `extraClasses`
//! property.

use pagecraft_render::{normalize_schema, SchemaChange};
use serde::Serialize;

use crate::db::component_service::ComponentStore;
use crate::error::CoreResult;

/// Per-run counters. Every listed component lands in exactly one of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl MigrationSummary {
    pub fn total(&self) -> usize {
        self.updated + self.skipped + self.errors
    }
}

/// Add `extraClasses` to every schema that lacks it and persist the result.
///
/// Only a failure to list components is returned as an error. Decode and save
/// failures are logged, counted, and the batch moves on to the next row.
pub async fn add_extra_classes<S: ComponentStore>(store: &S) -> CoreResult<MigrationSummary> {
    run(store, true).await
}

/// Same counts as [`add_extra_classes`] without writing anything.
pub async fn preview_extra_classes<S: ComponentStore>(store: &S) -> CoreResult<MigrationSummary> {
    run(store, false).await
}

async fn run<S: ComponentStore>(store: &S, persist: bool) -> CoreResult<MigrationSummary> {
    let components = store.list_components().await?;
    let mut summary = MigrationSummary::default();

    for component in &components {
        let normalized = match normalize_schema(&component.schema) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::error!(id = component.id, slug = %component.slug, error = %e, "could not decode schema");
                summary.errors += 1;
                continue;
            }
        };

        if normalized.change == SchemaChange::AlreadyPresent {
            tracing::info!(id = component.id, slug = %component.slug, "extraClasses already present, skipped");
            summary.skipped += 1;
            continue;
        }

        if !persist {
            tracing::info!(id = component.id, slug = %component.slug, "would add extraClasses");
            summary.updated += 1;
            continue;
        }

        match store.save_schema(component.id, &normalized.schema.to_value()).await {
            Ok(()) => {
                tracing::info!(id = component.id, slug = %component.slug, "added extraClasses");
                summary.updated += 1;
            }
            Err(e) => {
                tracing::error!(id = component.id, slug = %component.slug, error = %e, "could not save schema");
                summary.errors += 1;
            }
        }
    }

    tracing::info!(
        updated = summary.updated,
        skipped = summary.skipped,
        errors = summary.errors,
        dry_run = !persist,
        "schema migration finished"
    );
    Ok(summary)
}
