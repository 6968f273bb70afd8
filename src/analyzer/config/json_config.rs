use std::{error::Error, fs::File, io::BufReader, path::Path};

use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct JsonConfig {
    #[serde(default = "default_true")]
    pub use_name_heuristics: bool,
    #[serde(default = "default_true")]
    pub infer_setter_fields: bool,
    #[serde(default = "default_true")]
    pub atom_ui_support: bool,
}

fn default_true() -> bool {
    true
}

pub(crate) fn read_from_file(path: &Path) -> Result<JsonConfig, Box<dyn Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    Ok(serde_json::from_reader(reader)?)
}
