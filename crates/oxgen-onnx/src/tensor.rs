//! Constant tensor values (initializers).

use serde::Serialize;

/// Element types of constant tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    F32,
    I32,
    I64,
    U8,
    Bool,
}

/// Raw tensor data, separated from shape metadata.
///
/// Serializes as a flat list of its elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TensorData {
    I64(Vec<i64>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    Bool(Vec<bool>),
    U8(Vec<u8>),
}

impl TensorData {
    /// Get the number of elements in this tensor data.
    pub fn len(&self) -> usize {
        match self {
            TensorData::I64(v) => v.len(),
            TensorData::I32(v) => v.len(),
            TensorData::F32(v) => v.len(),
            TensorData::Bool(v) => v.len(),
            TensorData::U8(v) => v.len(),
        }
    }

    /// Check if this tensor data is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the data type of the elements.
    pub fn dtype(&self) -> DataType {
        match self {
            TensorData::I64(_) => DataType::I64,
            TensorData::I32(_) => DataType::I32,
            TensorData::F32(_) => DataType::F32,
            TensorData::Bool(_) => DataType::Bool,
            TensorData::U8(_) => DataType::U8,
        }
    }
}

/// A constant tensor known at code-generation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TensorValue {
    /// The raw tensor data.
    pub data: TensorData,

    /// The shape of the tensor (dimensions).
    pub shape: Vec<usize>,

    /// The data type of the tensor.
    pub dtype: DataType,
}

impl TensorValue {
    /// Create a new TensorValue. The dtype follows the data.
    ///
    /// # Panics
    ///
    /// Panics if the data length doesn't match the shape product.
    pub fn new(data: TensorData, shape: Vec<usize>) -> Self {
        let expected_len: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected_len,
            "Data length {} doesn't match shape {:?} (product = {})",
            data.len(),
            shape,
            expected_len
        );
        let dtype = data.dtype();
        Self { data, shape, dtype }
    }

    /// Create a 1-D i64 tensor, the usual form of shape and axes operands.
    pub fn from_i64s(values: Vec<i64>) -> Self {
        let len = values.len();
        Self::new(TensorData::I64(values), vec![len])
    }

    /// Get the number of elements in this tensor value.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if this tensor value is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Integer elements widened to i64.
    ///
    /// Returns `None` for floating point and boolean data.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match &self.data {
            TensorData::I64(v) => Some(v.clone()),
            TensorData::I32(v) => Some(v.iter().map(|&x| x as i64).collect()),
            TensorData::U8(v) => Some(v.iter().map(|&x| x as i64).collect()),
            TensorData::F32(_) | TensorData::Bool(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_value_dtype_follows_data() {
        let value = TensorValue::new(TensorData::I32(vec![1, 2, 3, 4]), vec![2, 2]);
        assert_eq!(value.dtype, DataType::I32);
        assert_eq!(value.shape, vec![2, 2]);
        assert_eq!(value.len(), 4);
    }

    #[test]
    fn test_to_i64_vec() {
        let axes = TensorValue::new(TensorData::I32(vec![0, -1]), vec![2]);
        assert_eq!(axes.to_i64_vec(), Some(vec![0, -1]));

        let floats = TensorValue::new(TensorData::F32(vec![0.5]), vec![1]);
        assert_eq!(floats.to_i64_vec(), None);
    }

    #[test]
    #[should_panic(expected = "doesn't match shape")]
    fn test_shape_mismatch_panics() {
        TensorValue::new(TensorData::F32(vec![1.0, 2.0]), vec![3]);
    }
}
