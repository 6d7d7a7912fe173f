//! wt-project: train configuration files and validation.
//!
//! Every load and save runs `validate_project`, so a `Project` obtained from
//! this crate is structurally sound. Whether it is square (degrees of freedom)
//! is only known after assembly.

use std::path::Path;

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{
    LATEST_VERSION, ValidationError, node_has_port, splitter_ratios, validate_project,
    validate_train,
};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding of a project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` is JSON, anything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    pub fn parse(self, content: &str) -> ProjectResult<Project> {
        let project: Project = match self {
            Format::Yaml => serde_yaml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
        };
        validate_project(&project)?;
        Ok(project)
    }

    pub fn render(self, project: &Project) -> ProjectResult<String> {
        validate_project(project)?;
        Ok(match self {
            Format::Yaml => serde_yaml::to_string(project)?,
            Format::Json => serde_json::to_string_pretty(project)?,
        })
    }
}

pub fn parse_yaml(content: &str) -> ProjectResult<Project> {
    Format::Yaml.parse(content)
}

pub fn parse_json(content: &str) -> ProjectResult<Project> {
    Format::Json.parse(content)
}

/// Load a project, picking the format from the file extension.
pub fn load(path: &Path) -> ProjectResult<Project> {
    Format::from_path(path).parse(&std::fs::read_to_string(path)?)
}

/// Save a project, picking the format from the file extension.
pub fn save(path: &Path, project: &Project) -> ProjectResult<()> {
    std::fs::write(path, Format::from_path(path).render(project)?)?;
    Ok(())
}

pub fn load_yaml(path: &Path) -> ProjectResult<Project> {
    Format::Yaml.parse(&std::fs::read_to_string(path)?)
}

pub fn save_yaml(path: &Path, project: &Project) -> ProjectResult<()> {
    std::fs::write(path, Format::Yaml.render(project)?)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<Project> {
    Format::Json.parse(&std::fs::read_to_string(path)?)
}

pub fn save_json(path: &Path, project: &Project) -> ProjectResult<()> {
    std::fs::write(path, Format::Json.render(project)?)?;
    Ok(())
}
