//! Drives a whole analysis run: module intake in dependency order, the
//! require-alias map, per-module walking, and finalization into the public
//! result.

use luana_analyzer::config::Config;
use luana_analyzer::context::AnalysisContext;
use luana_analyzer::finalizer::finalize;
use luana_ast::Chunk;
use luana_code_info::analysis_result::AnalysisResult;
use luana_code_info::diagnostic::{Diagnostic, DiagnosticKind, ParserError};
use luana_context_builder::walk_module;
use luana_logger::Logger;
use rustc_hash::FxHashSet;

#[cfg(test)]
mod tests;

/// One module as delivered by the upstream parser, in resolver order. A
/// failed parse arrives as the error so the run can skip it and continue.
pub struct ModuleSource {
    /// Slash-delimited path without extension.
    pub id: String,
    pub chunk: Result<Chunk, ParserError>,
}

pub fn analyze_modules(
    sources: Vec<ModuleSource>,
    config: &Config,
    logger: &Logger,
) -> AnalysisResult {
    let mut ctx = AnalysisContext::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    let mut seen_ids: FxHashSet<String> = FxHashSet::default();
    let mut accepted: Vec<(String, Chunk)> = Vec::new();

    for source in sources {
        if !seen_ids.insert(source.id.clone()) {
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::DuplicateModuleId,
                module: source.id.clone(),
                message: format!("duplicate module id {}", source.id),
            });
            continue;
        }

        match source.chunk {
            Ok(chunk) => accepted.push((source.id, chunk)),
            Err(error) => {
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::ParserError,
                    module: source.id.clone(),
                    message: match error {
                        ParserError::SyntaxError { message } => message,
                        ParserError::CannotReadFile => "cannot read file".to_string(),
                    },
                });
            }
        }
    }

    register_aliases(&mut ctx, &accepted);

    let mut resolved = Vec::with_capacity(accepted.len());
    for (id, chunk) in &accepted {
        logger.log_debug(&format!("analyzing {}", id));
        let module_id = ctx.intern(id);
        resolved.push(walk_module(&mut ctx, config, module_id, chunk));
    }

    let mut result = finalize(&mut ctx, &resolved, config, logger);
    result.diagnostics = diagnostics;
    result
}

/// Every proper path suffix of a module id aliases it. A suffix shared by
/// several modules stays in the map but is ignored at resolution time.
fn register_aliases(ctx: &mut AnalysisContext, accepted: &[(String, Chunk)]) {
    for (id, _) in accepted {
        let segments: Vec<&str> = id.split('/').collect();
        let full = ctx.intern(id);

        for start in 1..segments.len() {
            let suffix = segments[start..].join("/");
            let alias = ctx.intern(&suffix);

            let entry = ctx.module_aliases.entry(alias).or_default();
            if !entry.contains(&full) {
                entry.push(full);
            }
        }
    }
}
