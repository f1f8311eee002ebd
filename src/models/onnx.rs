//! ONNX Runtime backed price model

use crate::models::PriceModel;
use crate::types::features::{FeatureValue, FeatureVector};
use anyhow::{anyhow, bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::tensor::TensorElementType;
use ort::value::{DynValue, Tensor, ValueType};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Element type of one model input, restricted to what a listing row can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Float32,
    Float64,
    Int64,
    Text,
    Bool,
}

impl ColumnKind {
    fn from_element_type(ty: TensorElementType) -> Option<Self> {
        match ty {
            TensorElementType::Float32 => Some(ColumnKind::Float32),
            TensorElementType::Float64 => Some(ColumnKind::Float64),
            TensorElementType::Int64 => Some(ColumnKind::Int64),
            TensorElementType::String => Some(ColumnKind::Text),
            TensorElementType::Bool => Some(ColumnKind::Bool),
            _ => None,
        }
    }

    fn is_float(&self) -> bool {
        matches!(self, ColumnKind::Float32 | ColumnKind::Float64)
    }
}

/// A feature value converted to the element type its model input expects
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedCell {
    F32(f32),
    F64(f64),
    I64(i64),
    Text(String),
    Bool(bool),
}

/// Convert one cell for an input of `kind`.
///
/// Missing becomes NaN for float inputs and `missing_text` for text inputs.
/// Integer and boolean inputs have no representation for missing.
pub fn encode_cell(
    column: &str,
    value: &FeatureValue,
    kind: ColumnKind,
    missing_text: &str,
) -> Result<EncodedCell> {
    let cell = match (kind, value) {
        (ColumnKind::Float32, _) | (ColumnKind::Float64, _) => {
            let x = match value {
                FeatureValue::Missing => f64::NAN,
                FeatureValue::Float(x) => *x,
                FeatureValue::Integer(i) => *i as f64,
                FeatureValue::Flag(b) => f64::from(u8::from(*b)),
                FeatureValue::Text(s) => {
                    bail!("column '{}' expects a number but got text {:?}", column, s)
                }
            };
            if kind == ColumnKind::Float32 {
                EncodedCell::F32(x as f32)
            } else {
                EncodedCell::F64(x)
            }
        }
        (ColumnKind::Text, FeatureValue::Missing) => EncodedCell::Text(missing_text.to_string()),
        (ColumnKind::Text, FeatureValue::Text(s)) => EncodedCell::Text(s.clone()),
        (ColumnKind::Text, other) => {
            bail!("column '{}' expects text but got {}", column, other)
        }
        (ColumnKind::Int64, FeatureValue::Integer(i)) => EncodedCell::I64(*i),
        (ColumnKind::Int64, FeatureValue::Flag(b)) => EncodedCell::I64(i64::from(*b)),
        (ColumnKind::Int64, FeatureValue::Float(x)) if x.is_finite() && x.fract() == 0.0 => {
            EncodedCell::I64(*x as i64)
        }
        (ColumnKind::Int64, other) => {
            bail!("column '{}' expects an integer but got {}", column, other)
        }
        (ColumnKind::Bool, FeatureValue::Flag(b)) => EncodedCell::Bool(*b),
        (ColumnKind::Bool, FeatureValue::Integer(i)) if *i == 0 || *i == 1 => {
            EncodedCell::Bool(*i == 1)
        }
        (ColumnKind::Bool, other) => {
            bail!("column '{}' expects a boolean but got {}", column, other)
        }
    };
    Ok(cell)
}

/// Named model input with its element type
#[derive(Debug, Clone)]
pub struct ModelInput {
    pub name: String,
    pub kind: ColumnKind,
}

/// Loaded ONNX price model
pub struct OnnxPriceModel {
    name: String,
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    inputs: Vec<ModelInput>,
    missing_text: String,
}

impl OnnxPriceModel {
    /// Load an ONNX model from file
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize, missing_text: &str) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "price_model".to_string());

        info!(model = %name, path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let inputs = session
            .inputs
            .iter()
            .map(|input| match &input.input_type {
                ValueType::Tensor { ty, .. } => ColumnKind::from_element_type(*ty)
                    .map(|kind| ModelInput {
                        name: input.name.clone(),
                        kind,
                    })
                    .ok_or_else(|| {
                        anyhow!("input '{}' has unsupported element type {:?}", input.name, ty)
                    }),
                other => Err(anyhow!("input '{}' is not a tensor ({:?})", input.name, other)),
            })
            .collect::<Result<Vec<_>>>()?;

        if inputs.is_empty() {
            bail!("model declares no inputs");
        }

        info!(
            model = %name,
            inputs = inputs.len(),
            outputs = session.outputs.len(),
            "Model loaded successfully"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            inputs,
            missing_text: missing_text.to_string(),
        })
    }
}

/// Encoded values for one named model input
#[derive(Debug, Clone, PartialEq)]
pub struct InputPlan {
    pub name: String,
    pub kind: ColumnKind,
    pub cells: Vec<EncodedCell>,
}

/// Match the model inputs against a row and encode every value they take.
///
/// A single input that is not itself a row column takes the whole row as
/// one float vector in row order. Otherwise each input takes the row column
/// of the same name.
pub fn plan_inputs(
    inputs: &[ModelInput],
    row: &FeatureVector,
    missing_text: &str,
) -> Result<Vec<InputPlan>> {
    match inputs {
        [packed] if row.get(&packed.name).is_none() => {
            if !packed.kind.is_float() {
                bail!(
                    "packed input '{}' must be a float tensor, found {:?}",
                    packed.name,
                    packed.kind
                );
            }
            let cells = row
                .iter()
                .map(|(column, value)| encode_cell(column, value, packed.kind, missing_text))
                .collect::<Result<Vec<_>>>()?;
            Ok(vec![InputPlan {
                name: packed.name.clone(),
                kind: packed.kind,
                cells,
            }])
        }
        _ => inputs
            .iter()
            .map(|input| {
                let value = row.get(&input.name).ok_or_else(|| {
                    anyhow!("model input '{}' has no matching feature column", input.name)
                })?;
                Ok(InputPlan {
                    name: input.name.clone(),
                    kind: input.kind,
                    cells: vec![encode_cell(&input.name, value, input.kind, missing_text)?],
                })
            })
            .collect(),
    }
}

/// Wrap a planned input as a `[1, n]` tensor
fn input_tensor(plan: &InputPlan) -> Result<DynValue> {
    let shape = vec![1_i64, plan.cells.len() as i64];
    let value = match plan.kind {
        ColumnKind::Float32 => {
            let data = typed_cells(plan, |cell| match cell {
                EncodedCell::F32(x) => Some(*x),
                _ => None,
            })?;
            Tensor::from_array((shape, data))?.into_dyn()
        }
        ColumnKind::Float64 => {
            let data = typed_cells(plan, |cell| match cell {
                EncodedCell::F64(x) => Some(*x),
                _ => None,
            })?;
            Tensor::from_array((shape, data))?.into_dyn()
        }
        ColumnKind::Int64 => {
            let data = typed_cells(plan, |cell| match cell {
                EncodedCell::I64(i) => Some(*i),
                _ => None,
            })?;
            Tensor::from_array((shape, data))?.into_dyn()
        }
        ColumnKind::Bool => {
            let data = typed_cells(plan, |cell| match cell {
                EncodedCell::Bool(b) => Some(*b),
                _ => None,
            })?;
            Tensor::from_array((shape, data))?.into_dyn()
        }
        ColumnKind::Text => {
            let texts = typed_cells(plan, |cell| match cell {
                EncodedCell::Text(s) => Some(s.clone()),
                _ => None,
            })?;
            Tensor::from_string_array((shape, texts.as_slice()))?.into_dyn()
        }
    };
    Ok(value)
}

fn typed_cells<T>(plan: &InputPlan, pick: impl Fn(&EncodedCell) -> Option<T>) -> Result<Vec<T>> {
    plan.cells
        .iter()
        .map(|cell| {
            pick(cell).ok_or_else(|| {
                anyhow!("input '{}' is {:?} but holds {:?}", plan.name, plan.kind, cell)
            })
        })
        .collect()
}

/// First numeric element of the first output that has one
fn extract_price(outputs: &SessionOutputs) -> Result<f64> {
    for (name, output) in outputs.iter() {
        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            if let Some(&price) = data.first() {
                debug!(output = %name, price = price, "Extracted f32 prediction");
                return Ok(f64::from(price));
            }
        }
        if let Ok((_, data)) = output.try_extract_tensor::<f64>() {
            if let Some(&price) = data.first() {
                debug!(output = %name, price = price, "Extracted f64 prediction");
                return Ok(price);
            }
        }
    }
    Err(anyhow!("model produced no numeric output"))
}

impl PriceModel for OnnxPriceModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, row: &FeatureVector) -> Result<f64> {
        let inputs = plan_inputs(&self.inputs, row, &self.missing_text)?
            .iter()
            .map(|plan| Ok((plan.name.clone(), input_tensor(plan)?)))
            .collect::<Result<Vec<(String, DynValue)>>>()?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;
        let outputs = session.run(inputs).context("ONNX Runtime inference failed")?;

        extract_price(&outputs)
    }
}
