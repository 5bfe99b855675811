use crate::common::DecodeError;
use ndarray::ArrayViewD;

/// Flat engine output plus the caller-declared stride.
///
/// The stride is not self-describing: for detector output it is the offset of
/// the score block, for landmark output the length of the coordinate block.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a> {
    data: &'a [f32],
    stride: usize,
}

impl<'a> TensorView<'a> {
    pub fn new(data: &'a [f32], stride: usize) -> Self {
        Self { data, stride }
    }

    /// Wraps an `ndarray` view as extracted from an engine output.
    pub fn from_array(array: ArrayViewD<'a, f32>, stride: usize) -> Result<Self, DecodeError> {
        let data = array.to_slice().ok_or(DecodeError::NonContiguous)?;
        Ok(Self { data, stride })
    }

    pub fn data(&self) -> &'a [f32] {
        self.data
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fails unless at least `needed` values are present.
    pub fn require(&self, needed: usize) -> Result<(), DecodeError> {
        if self.data.len() < needed {
            return Err(DecodeError::TensorTooShort {
                needed,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}
