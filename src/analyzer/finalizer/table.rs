use luana_code_info::analyzed_module::{AnalyzedTable, AnalyzedTableField};
use luana_code_info::expression::ExpressionInfo;
use luana_code_info::ids::TableId;
use luana_code_info::table_info::display_key;

use super::ModuleFinalizer;

impl ModuleFinalizer<'_> {
    /// Rebuild a literal table in definition order. Keys that continue the
    /// implicit numeric sequence from 1 stay auto-indexed; a field carries
    /// types only when more than one definition contributed to it. A table
    /// currently being emitted higher up the stack yields an empty
    /// placeholder, which is how emission breaks reference cycles.
    pub(crate) fn finalize_table_id(
        &mut self,
        table_id: TableId,
        name: Option<String>,
    ) -> AnalyzedTable {
        if !self.in_progress_tables.insert(table_id) {
            return AnalyzedTable {
                name,
                fields: Vec::new(),
            };
        }

        let definition_entries: Vec<(String, Vec<ExpressionInfo>)> = self
            .ctx
            .table(table_id)
            .definitions
            .iter()
            .map(|(key, definitions)| (key.clone(), definitions.clone()))
            .collect();

        let mut fields = Vec::new();
        let mut next_auto = 1usize;

        for (key, definitions) in definition_entries {
            let continues_sequence = key
                .parse::<usize>()
                .map(|position| position == next_auto)
                .unwrap_or(false);
            let emitted_key = if continues_sequence {
                next_auto += 1;
                None
            } else {
                Some(display_key(&key))
            };

            let Some(first) = definitions.first() else {
                continue;
            };
            let value = self.finalize_expression(&first.clone());

            let types = if definitions.len() >= 2 {
                let references: Vec<&ExpressionInfo> = definitions.iter().collect();
                self.finalize_types(&self.union_types(&references))
            } else {
                Vec::new()
            };

            fields.push(AnalyzedTableField {
                key: emitted_key,
                types,
                value,
            });
        }

        self.in_progress_tables.remove(&table_id);

        AnalyzedTable { name, fields }
    }
}
