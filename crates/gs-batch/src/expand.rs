//! List-field expansion into concrete scenario variants.

use gs_core::{AttrMap, Value};
use gs_graph::{ConfigError, ConfigResult, ScenarioConfig};
use tracing::debug;

/// How list-valued fields combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpansionMode {
    /// Every combination; the last field varies fastest.
    #[default]
    Cartesian,
    /// Position `i` of every list forms variant `i`; lengths must agree.
    Aligned,
}

impl ExpansionMode {
    pub fn from_align(align_parameters: bool) -> Self {
        if align_parameters {
            ExpansionMode::Aligned
        } else {
            ExpansionMode::Cartesian
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Parameter,
    State,
}

/// A parameter or state declared as a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListField {
    pub model: String,
    pub field: String,
    pub kind: FieldKind,
    pub values: Vec<Value>,
}

impl ListField {
    /// `"<model>.<field>"`
    pub fn key(&self) -> String {
        format!("{}.{}", self.model, self.field)
    }
}

/// One concrete scenario produced by expansion.
#[derive(Debug, Clone)]
pub struct ScenarioVariant {
    /// `0..N` in expansion order.
    pub id: usize,
    pub config: ScenarioConfig,
    /// Chosen value per expanded field, keyed `"<model>.<field>"`.
    pub assignments: AttrMap,
}

/// Every list-valued parameter or state, in model declaration order, then
/// parameters before states, then key order.
pub fn list_fields(config: &ScenarioConfig) -> Vec<ListField> {
    let mut fields = Vec::new();
    for spec in config.models() {
        for (kind, map) in [
            (FieldKind::Parameter, &spec.parameters),
            (FieldKind::State, &spec.states),
        ] {
            for (key, value) in map {
                if let Value::List(values) = value {
                    fields.push(ListField {
                        model: spec.name.clone(),
                        field: key.clone(),
                        kind,
                        values: values.clone(),
                    });
                }
            }
        }
    }
    fields
}

/// Index tuples selecting one value per field.
fn combinations(fields: &[ListField], mode: ExpansionMode) -> ConfigResult<Vec<Vec<usize>>> {
    if let Some(empty) = fields.iter().find(|f| f.values.is_empty()) {
        return Err(ConfigError::InvalidSpec {
            model: empty.model.clone(),
            what: format!("list field '{}' is empty", empty.field),
        });
    }

    match mode {
        ExpansionMode::Aligned => {
            let lengths: Vec<usize> = fields.iter().map(|f| f.values.len()).collect();
            let m = lengths.first().copied().unwrap_or(1);
            if lengths.iter().any(|&len| len != m) {
                return Err(ConfigError::MismatchedListLength {
                    fields: fields.iter().map(ListField::key).collect(),
                    lengths,
                });
            }
            Ok((0..m).map(|i| vec![i; fields.len()]).collect())
        }
        ExpansionMode::Cartesian => {
            let mut combos: Vec<Vec<usize>> = vec![Vec::new()];
            for field in fields {
                combos = combos
                    .into_iter()
                    .flat_map(|prefix| {
                        (0..field.values.len()).map(move |i| {
                            let mut combo = prefix.clone();
                            combo.push(i);
                            combo
                        })
                    })
                    .collect();
            }
            Ok(combos)
        }
    }
}

/// Expand a frozen scenario into its variants.
///
/// A scenario without list fields yields exactly one variant, a copy of
/// itself. Each variant is rebuilt and re-frozen, so it is validated like
/// any hand-written scenario.
pub fn expand(config: &ScenarioConfig, mode: ExpansionMode) -> ConfigResult<Vec<ScenarioVariant>> {
    let fields = list_fields(config);
    let combos = combinations(&fields, mode)?;
    debug!(
        scenario = config.name(),
        fields = fields.len(),
        variants = combos.len(),
        ?mode,
        "expanding scenario"
    );

    let mut variants = Vec::with_capacity(combos.len());
    for (id, combo) in combos.into_iter().enumerate() {
        let mut builder = config.to_builder();
        let mut assignments = AttrMap::new();
        for (field, &i) in fields.iter().zip(&combo) {
            let value = field.values[i].clone();
            match field.kind {
                FieldKind::Parameter => {
                    builder.set_model_param(&field.model, field.field.clone(), value.clone())?
                }
                FieldKind::State => builder.set_model_state(&field.model, &field.field, value.clone())?,
            }
            assignments.insert(field.key(), value);
        }
        variants.push(ScenarioVariant {
            id,
            config: builder.freeze()?,
            assignments,
        });
    }
    Ok(variants)
}
