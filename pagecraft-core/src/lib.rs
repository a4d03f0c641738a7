//! Component storage and batch jobs for Pagecraft.
//!
//! Component definitions live in Postgres (see [`db::component_service`]).
//! [`schema_migration`] brings stored schemas up to the canonical shape, and
//! [`config`] / [`logging`] carry the settings shared by the binaries.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod schema_migration;

pub use config::AppConfig;
pub use db::component_service::{
    ComponentCategory, ComponentDefinition, ComponentService, ComponentStore, NewComponent,
};
pub use error::{CoreError, CoreResult};
pub use schema_migration::{add_extra_classes, preview_extra_classes, MigrationSummary};
