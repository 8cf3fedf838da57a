//! Fragment generators: one per resource kind.
//!
//! Every generator consumes a typed definition plus the accumulating
//! document and follows the same contract: exactly one new resource keyed
//! by the definition's synthetic id, parameters declared for every
//! remapped attribute, and a no-op when the key already exists (the same
//! data source is routinely reached through several datasets).

pub mod analysis;
pub mod dataset;
pub mod datasource;
pub mod schedule;
pub mod template;

use bw_core::DataSourceDef;

/// Traceability description for a remapped connection attribute; the
/// `(ID <id>, type <t>) with index <n>` segment is what later passes parse
/// to attribute a parameter back to its owning resource.
pub(crate) fn remap_description(attribute: &str, def: &DataSourceDef) -> String {
    format!(
        "{} to use for data source {} (ID {}, type {}) with index {} in the stage, \
         to be parametrized via the deploy action of the pipeline. \
         This parameter was added because remapping was requested",
        attribute,
        def.name(),
        def.id(),
        def.api_type(),
        def.index()
    )
}
