use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::analyzed_module::AnalyzedModule;
use crate::diagnostic::Diagnostic;

/// The whole-program output: analyzed modules in dependency order plus the
/// diagnostics accumulated along the way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analyzed_modules: IndexMap<String, AnalyzedModule>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        AnalysisResult {
            analyzed_modules: IndexMap::new(),
            diagnostics: Vec::new(),
        }
    }
}
