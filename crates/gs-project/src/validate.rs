//! Structural validation of scenario files.
//!
//! Catches reference mistakes with file-level context before the builder
//! applies its own semantic checks.

use std::collections::HashSet;

use crate::schema::ScenarioFile;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

fn model_of(reference: &str) -> Option<&str> {
    reference.split_once('.').map(|(model, _)| model)
}

pub fn validate_scenario(file: &ScenarioFile) -> Result<(), ValidationError> {
    if file.scenario.name.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "scenario.name".to_string(),
            value: file.scenario.name.clone(),
            reason: "must not be empty".to_string(),
        });
    }
    if file.scenario.resolution == 0 {
        return Err(ValidationError::InvalidValue {
            field: "scenario.resolution".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    let mut names = HashSet::new();
    for model in &file.models {
        if !names.insert(model.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: model.name.clone(),
                context: "models".to_string(),
            });
        }
        if model.step_size == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: format!("models.{}.step_size", model.name),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
    }

    let check_ref = |reference: &str, context: String| -> Result<(), ValidationError> {
        match model_of(reference) {
            Some(model) if names.contains(model) => Ok(()),
            Some(model) => Err(ValidationError::MissingReference {
                id: model.to_string(),
                context,
            }),
            None => Err(ValidationError::InvalidValue {
                field: context,
                value: reference.to_string(),
                reason: "expected '<model>.<attr>'".to_string(),
            }),
        }
    };

    for model in &file.models {
        for conn in &model.connect {
            check_ref(&conn.to, format!("models.{}.connect", model.name))?;
        }
    }
    for conn in &file.connections {
        check_ref(&conn.from, "connections.from".to_string())?;
        check_ref(&conn.to, "connections.to".to_string())?;
    }
    for request in &file.async_requests {
        for (id, context) in [(&request.source, "source"), (&request.dest, "dest")] {
            if !names.contains(id.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: id.clone(),
                    context: format!("async_requests.{}", context),
                });
            }
        }
    }
    for reference in &file.monitor {
        check_ref(reference, "monitor".to_string())?;
    }

    if let Some(batch) = &file.batch {
        if batch.workers == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: "batch.workers".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
    }

    Ok(())
}
