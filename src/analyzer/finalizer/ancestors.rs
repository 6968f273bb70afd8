use luana_code_info::analysis_result::AnalysisResult;
use rustc_hash::{FxHashMap, FxHashSet};

/// Remove instance fields that an ancestor already declares with the same
/// name and types. Ancestors are snapshotted before any pruning, so running
/// the pass twice changes nothing.
pub fn finalize_class_fields(result: &mut AnalysisResult) {
    let mut index: FxHashMap<String, (Option<String>, Vec<(String, Vec<String>)>)> =
        FxHashMap::default();

    for module in result.analyzed_modules.values() {
        for class in &module.classes {
            index.entry(class.name.clone()).or_insert_with(|| {
                (
                    class.base.clone(),
                    class
                        .fields
                        .iter()
                        .map(|field| (field.name.clone(), field.types.clone()))
                        .collect(),
                )
            });
        }
    }

    for module in result.analyzed_modules.values_mut() {
        for class in module.classes.iter_mut() {
            if class.base.is_none() {
                continue;
            }

            let mut ancestor_fields: FxHashSet<(String, Vec<String>)> = FxHashSet::default();
            let mut visited: FxHashSet<String> = FxHashSet::default();
            let mut current = class.base.clone();

            while let Some(base_name) = current {
                if !visited.insert(base_name.clone()) {
                    break;
                }
                let Some((next_base, fields)) = index.get(&base_name) else {
                    break;
                };
                ancestor_fields.extend(fields.iter().cloned());
                current = next_base.clone();
            }

            if ancestor_fields.is_empty() {
                continue;
            }

            class
                .fields
                .retain(|field| !ancestor_fields.contains(&(field.name.clone(), field.types.clone())));
        }
    }
}
