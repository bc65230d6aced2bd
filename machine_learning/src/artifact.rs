use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    boosting::GradientBooster,
    error::{MlErr, Result},
};

/// A fitted model together with the ordered feature names its rows are made of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub features: Vec<String>,
    pub model: GradientBooster,
}

impl Artifact {
    /// Returns a new `Artifact`.
    ///
    /// # Returns
    /// An error if the model wasn't fitted on exactly `features.len()` features.
    pub fn new(features: Vec<String>, model: GradientBooster) -> Result<Self> {
        if features.len() != model.n_features() {
            return Err(MlErr::SizeMismatch {
                a: "features",
                b: "model features",
                got: features.len(),
                expected: model.n_features(),
            });
        }

        Ok(Self { features, model })
    }

    /// Writes the artifact to `path`, overwriting whatever was there.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;

        info!("saved {} features and model to {}", self.features.len(), path.display());
        Ok(())
    }

    /// Reads an artifact previously written with [`Artifact::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let Artifact { features, model } = bincode::deserialize_from(reader)?;
        Self::new(features, model)
    }

    pub fn into_parts(self) -> (Vec<String>, GradientBooster) {
        (self.features, self.model)
    }
}
