use std::path::PathBuf;

use serde::Deserialize;

use crate::seating::SeatingChart;
use crate::store::SeatingStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<Box<dyn SeatingStore>>,
    /// The class currently open in the host UI.
    pub chart: Option<SeatingChart>,
}

impl AppState {
    /// Swaps the backing store. Any open class is dropped so it reloads from
    /// the new store.
    pub fn use_store(&mut self, workspace: Option<PathBuf>, store: Box<dyn SeatingStore>) {
        self.workspace = workspace;
        self.store = Some(store);
        self.chart = None;
    }
}
