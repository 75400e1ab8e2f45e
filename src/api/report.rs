//! Contract between the engine and report generators.

use crate::analyzers::Analyzer;
use crate::core::errors::Result;

/// Consumer of analyzer results.
///
/// Generators pull metrics out of the analyzers they are handed, through
/// [`Analyzer::as_node_aware`] and [`Analyzer::as_project_aware`]; analyzers
/// never push into a generator.
pub trait ReportGenerator {
    /// Identifiers of the analyzers this generator reads
    fn accepted_analyzers(&self) -> Vec<&'static str>;

    /// Receive one analyzed analyzer; called once per accepted identifier
    fn log_analyzer(&mut self, analyzer: &dyn Analyzer);

    /// Finish the report
    fn close(&mut self) -> Result<()>;
}
