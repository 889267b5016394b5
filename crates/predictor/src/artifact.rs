//! Binary model artifact.
//!
//! The trained model is stored as a single protobuf message:
//!
//! ```text
//! message SvdModelProto {
//!   float global_mean = 1;
//!   float rating_min = 2;
//!   float rating_max = 3;
//!   uint32 n_factors = 4;
//!   repeated FactorRow users = 5;
//!   repeated FactorRow items = 6;
//! }
//! message FactorRow {
//!   uint32 id = 1;
//!   float bias = 2;
//!   repeated float factors = 3;
//! }
//! ```

use crate::svd::{LatentFactors, SvdModel};
use crate::ModelLoadError;
use prost::Message;
use std::path::Path;
use tracing::{error, info};

#[derive(Clone, PartialEq, Message)]
pub struct SvdModelProto {
    #[prost(float, tag = "1")]
    pub global_mean: f32,
    #[prost(float, tag = "2")]
    pub rating_min: f32,
    #[prost(float, tag = "3")]
    pub rating_max: f32,
    #[prost(uint32, tag = "4")]
    pub n_factors: u32,
    #[prost(message, repeated, tag = "5")]
    pub users: Vec<FactorRow>,
    #[prost(message, repeated, tag = "6")]
    pub items: Vec<FactorRow>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FactorRow {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(float, tag = "2")]
    pub bias: f32,
    #[prost(float, repeated, tag = "3")]
    pub factors: Vec<f32>,
}

/// Load the pre-trained model stored at `path`.
///
/// # Errors
/// - [`ModelLoadError::NotFound`] if the file does not exist
/// - [`ModelLoadError::Corrupt`] if the bytes are not a model message
/// - [`ModelLoadError::Invalid`] if the message cannot serve estimates
pub fn load_predictor(path: &Path) -> Result<SvdModel, ModelLoadError> {
    info!("Loading pre-trained model from {}", path.display());

    let bytes = std::fs::read(path).map_err(|source| {
        error!("Could not read model file {}: {}", path.display(), source);
        if source.kind() == std::io::ErrorKind::NotFound {
            ModelLoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ModelLoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let model = SvdModel::from_bytes(&bytes)?;
    let (users, items) = model.counts();
    info!(
        "Model loaded: {} users, {} items, {} factors",
        users,
        items,
        model.n_factors()
    );
    Ok(model)
}

impl SvdModel {
    /// Decode and validate a model artifact
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let proto = SvdModelProto::decode(bytes)?;
        SvdModel::try_from(proto)
    }

    /// Encode this model in the artifact format
    pub fn encode_to_vec(&self) -> Vec<u8> {
        SvdModelProto::from(self).encode_to_vec()
    }
}

impl TryFrom<SvdModelProto> for SvdModel {
    type Error = ModelLoadError;

    fn try_from(proto: SvdModelProto) -> Result<Self, Self::Error> {
        if proto.users.is_empty() && proto.items.is_empty() {
            return Err(ModelLoadError::Invalid(
                "model has no trained users or items".to_string(),
            ));
        }

        let mut model = SvdModel::new(
            proto.global_mean,
            proto.rating_min,
            proto.rating_max,
            proto.n_factors as usize,
        )?;
        for row in proto.users {
            model.insert_user(row.id, LatentFactors::new(row.bias, row.factors))?;
        }
        for row in proto.items {
            model.insert_item(row.id, LatentFactors::new(row.bias, row.factors))?;
        }
        Ok(model)
    }
}

impl From<&SvdModel> for SvdModelProto {
    fn from(model: &SvdModel) -> Self {
        let (rating_min, rating_max) = model.rating_scale();
        Self {
            global_mean: model.global_mean(),
            rating_min,
            rating_max,
            n_factors: model.n_factors() as u32,
            users: rows_sorted_by_id(&model.users),
            items: rows_sorted_by_id(&model.items),
        }
    }
}

/// Rows in id order so the same model always encodes to the same bytes
fn rows_sorted_by_id(rows: &std::collections::HashMap<u32, LatentFactors>) -> Vec<FactorRow> {
    let mut out: Vec<FactorRow> = rows
        .iter()
        .map(|(&id, row)| FactorRow {
            id,
            bias: row.bias,
            factors: row.factors.clone(),
        })
        .collect();
    out.sort_by_key(|row| row.id);
    out
}
