use std::sync::Arc;

use axum::extract::FromRef;

use crate::{grading::ScoringTable, store::GradingStore};

pub type DynStore = Arc<dyn GradingStore>;

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub table: ScoringTable,
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for ScoringTable {
    fn from_ref(state: &AppState) -> Self {
        state.table
    }
}
