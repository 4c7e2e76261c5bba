use serde::{Deserialize, Serialize};
use sift_base::{Error, Result, ScalarRange};

/// A named, single-component array of values attached to points or cells.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarArray {
    name: String,
    values: Vec<f64>,
}

impl ScalarArray {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn range(&self) -> Option<ScalarRange> {
        ScalarRange::from_values(&self.values)
    }

    /// Gathers `ids` into a new array of the same name. Ids must be in bounds.
    pub fn select(&self, ids: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            values: ids.iter().map(|&id| self.values[id]).collect(),
        }
    }
}

/// Arrays attached to one entity kind (points or cells), with an optional
/// active scalars selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    arrays: Vec<ScalarArray>,
    #[serde(default)]
    active_scalars: Option<usize>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `array`, replacing any array with the same name. Returns its index.
    pub fn add_array(&mut self, array: ScalarArray) -> usize {
        match self.arrays.iter().position(|a| a.name == array.name) {
            Some(index) => {
                self.arrays[index] = array;
                index
            }
            None => {
                self.arrays.push(array);
                self.arrays.len() - 1
            }
        }
    }

    /// Adds `array` and makes it the active scalars.
    pub fn add_scalars(&mut self, array: ScalarArray) {
        let index = self.add_array(array);
        self.active_scalars = Some(index);
    }

    pub fn scalars(&self) -> Option<&ScalarArray> {
        self.active_scalars.and_then(|index| self.arrays.get(index))
    }

    pub fn arrays(&self) -> &[ScalarArray] {
        &self.arrays
    }

    pub fn array(&self, name: &str) -> Option<&ScalarArray> {
        self.arrays.iter().find(|a| a.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Replaces the values of the active scalars, keeping the length.
    pub fn replace_scalar_values(&mut self, values: Vec<f64>) -> Result<()> {
        let index = self
            .active_scalars
            .ok_or_else(|| Error::InvalidParameter("no active scalars".to_string()))?;
        let array = &mut self.arrays[index];
        if array.values.len() != values.len() {
            return Err(Error::InvalidParameter(format!(
                "scalars `{}` expect {} values, got {}",
                array.name,
                array.values.len(),
                values.len()
            )));
        }
        array.values = values;
        Ok(())
    }

    /// Gathers every array at `ids`, keeping the active selection.
    pub fn select(&self, ids: &[usize]) -> Self {
        Self {
            arrays: self.arrays.iter().map(|a| a.select(ids)).collect(),
            active_scalars: self.active_scalars,
        }
    }

    pub(crate) fn validate(&self, expected: usize, owner: &str) -> Result<()> {
        if let Some(index) = self.active_scalars {
            if index >= self.arrays.len() {
                return Err(Error::InvalidDataset(format!(
                    "{owner} active scalars index {index} out of range"
                )));
            }
        }
        for array in &self.arrays {
            if array.len() != expected {
                return Err(Error::InvalidDataset(format!(
                    "{owner} array `{}` has {} values, expected {expected}",
                    array.name,
                    array.len()
                )));
            }
        }
        Ok(())
    }
}
