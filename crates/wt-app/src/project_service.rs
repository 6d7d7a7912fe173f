//! Project loading, validation, and introspection.

use std::path::Path;
use wt_project::Format;
use wt_project::schema::{NodeKind, Project, TrainDef};

use crate::error::{AppError, AppResult};

/// Summary of a train for listing.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub id: String,
    pub name: String,
    pub constituents: usize,
    pub unit_count: usize,
    pub junction_count: usize,
    pub edge_count: usize,
}

/// Load and validate a project from YAML or JSON (by extension).
pub fn load_project(path: &Path) -> AppResult<Project> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ProjectFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Format::from_path(path).parse(&content)?)
}

pub fn validate_project(project: &Project) -> AppResult<()> {
    if project.trains.is_empty() {
        return Err(AppError::Validation(
            "Project must have at least one train".to_string(),
        ));
    }
    wt_project::validate_project(project)?;
    Ok(())
}

pub fn list_trains(project: &Project) -> Vec<TrainSummary> {
    project
        .trains
        .iter()
        .map(|train| {
            let count = |f: fn(&NodeKind) -> bool| train.nodes.iter().filter(|n| f(&n.kind)).count();
            TrainSummary {
                id: train.id.clone(),
                name: train.name.clone(),
                constituents: train.constituents.len(),
                unit_count: count(|k| matches!(k, NodeKind::Unit { .. })),
                junction_count: count(|k| {
                    matches!(k, NodeKind::Splitter { .. } | NodeKind::Mixer { .. })
                }),
                edge_count: train.edges.len(),
            }
        })
        .collect()
}

pub fn get_train<'a>(project: &'a Project, train_id: &str) -> AppResult<&'a TrainDef> {
    project
        .train(train_id)
        .ok_or_else(|| AppError::TrainNotFound(train_id.to_string()))
}
