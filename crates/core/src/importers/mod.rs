//! Importers module - generic ERP import pipeline and per-entity mappers.

pub mod article_matcher;
pub mod document;
pub mod kernel;

mod job_materials_importer;
mod job_routing_importer;
mod material_importer;
mod part_importer;
mod production_importer;

pub use document::{DocumentImportSummary, DocumentImporter, StagedDocument};
pub use job_materials_importer::JobMaterialsImporter;
pub use job_routing_importer::JobRoutingImporter;
pub use kernel::{
    DuplicateAction, EntityImporter, FieldMapping, ImportCounters, ImportPreview, ImportSummary,
    ImporterConfig, MappedRow, PreviewRow, ValidationReport,
};
pub use material_importer::MaterialItemImporter;
pub use part_importer::PartImporter;
pub use production_importer::ProductionImporter;

#[cfg(test)]
mod kernel_tests;
