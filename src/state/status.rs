//! Load/save lifecycle of one grid instance
//!
//! `Idle -> Loading -> (Loaded | LoadError)`, `Loaded -> Dirty` on any row
//! mutation, `Dirty -> Saving -> (Loaded | SaveError)`. A save error keeps
//! the dirty snapshot until the user retries or discards.

use crate::error::SaveFailure;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GridStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadError(String),
    Dirty,
    Saving,
    SaveError(SaveFailure),
}

impl GridStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, GridStatus::Loading | GridStatus::Saving)
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, GridStatus::Saving)
    }

    /// The status a successful row mutation moves to. Mutations during a
    /// load or save do not change the displayed status.
    pub fn after_mutation(&self) -> GridStatus {
        match self {
            GridStatus::Loading | GridStatus::Saving => self.clone(),
            _ => GridStatus::Dirty,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GridStatus::Idle => "idle",
            GridStatus::Loading => "loading",
            GridStatus::Loaded => "loaded",
            GridStatus::LoadError(_) => "load error",
            GridStatus::Dirty => "unsaved changes",
            GridStatus::Saving => "saving",
            GridStatus::SaveError(_) => "save failed",
        }
    }
}
