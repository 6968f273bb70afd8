use std::error::Error;
use std::path::Path;

pub mod json_config;

#[derive(Debug, Clone)]
pub struct Config {
    pub root_dir: String,

    /// Seed parameter types from conventional names (`x`, `r`, `dx`, …).
    pub use_name_heuristics: bool,

    /// Walk nested plain tables of foreign classes for dotted setter fields.
    pub infer_setter_fields: bool,

    /// Recognize the atom-UI base/child constructor shapes.
    pub atom_ui_support: bool,
}

impl Config {
    pub fn new(root_dir: String) -> Self {
        Self {
            root_dir,
            use_name_heuristics: true,
            infer_setter_fields: true,
            atom_ui_support: true,
        }
    }

    pub fn update_from_file(&mut self, config_path: &Path) -> Result<(), Box<dyn Error>> {
        let json_config = json_config::read_from_file(config_path)?;

        self.use_name_heuristics = json_config.use_name_heuristics;
        self.infer_setter_fields = json_config.infer_setter_fields;
        self.atom_ui_support = json_config.atom_ui_support;

        Ok(())
    }
}
