use crate::MatrixError;
use base64::{engine::general_purpose::STANDARD, Engine};

/// Row-major embedding matrix decoded from a packed little-endian f32 buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    values: Vec<f32>,
    rows: usize,
    dim: usize,
}

impl EmbeddingMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.dim;
        self.values.get(start..start + self.dim)
    }
}

/// Decodes `encoded` into one row per exported record.
///
/// The row width is inferred from the buffer length and `records`, unless the
/// export declares it via `declared_dim`, in which case the row count is
/// derived from that and must equal `records`.
pub fn decode_matrix(
    encoded: &str,
    records: usize,
    declared_dim: Option<usize>,
) -> Result<EmbeddingMatrix, MatrixError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|error| MatrixError::Base64(error.to_string()))?;

    if bytes.len() % 4 != 0 {
        return Err(MatrixError::TruncatedBuffer(bytes.len()));
    }

    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|word| f32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect();

    if values.is_empty() {
        if records == 0 {
            return Ok(EmbeddingMatrix {
                values,
                rows: 0,
                dim: declared_dim.unwrap_or_default(),
            });
        }
        return Err(MatrixError::Empty { records });
    }

    let (rows, dim) = match declared_dim.filter(|dim| *dim > 0) {
        Some(dim) => {
            if values.len() % dim != 0 {
                return Err(MatrixError::ShapeMismatch {
                    values: values.len(),
                    records,
                });
            }
            (values.len() / dim, dim)
        }
        None => {
            if records == 0 || values.len() % records != 0 {
                return Err(MatrixError::ShapeMismatch {
                    values: values.len(),
                    records,
                });
            }
            (records, values.len() / records)
        }
    };

    if rows != records {
        return Err(MatrixError::RowCountMismatch { rows, records });
    }

    Ok(EmbeddingMatrix { values, rows, dim })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(values: &[f32]) -> String {
        let bytes: Vec<u8> = values.iter().flat_map(|value| value.to_le_bytes()).collect();
        STANDARD.encode(bytes)
    }

    #[test]
    fn rows_follow_record_order() -> Result<(), MatrixError> {
        let encoded = encode(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let matrix = decode_matrix(&encoded, 3, None)?;
        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.dim(), 2);
        assert_eq!(matrix.row(0), Some(&[1.0, 2.0][..]));
        assert_eq!(matrix.row(2), Some(&[5.0, 6.0][..]));
        assert_eq!(matrix.row(3), None);
        Ok(())
    }

    #[test]
    fn declared_dimension_exposes_row_count_mismatch() {
        let encoded = encode(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            decode_matrix(&encoded, 3, Some(2)),
            Err(MatrixError::RowCountMismatch { rows: 2, records: 3 })
        );
    }

    #[test]
    fn indivisible_buffer_is_a_shape_mismatch() {
        let encoded = encode(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let error = decode_matrix(&encoded, 2, None).unwrap_err();
        assert_eq!(error, MatrixError::ShapeMismatch { values: 5, records: 2 });
        assert!(!error.is_recoverable());
    }

    #[test]
    fn corrupt_input_is_recoverable() {
        let error = decode_matrix("not base64!!", 1, None).unwrap_err();
        assert!(matches!(error, MatrixError::Base64(_)));
        assert!(error.is_recoverable());

        let error = decode_matrix(&STANDARD.encode([0u8, 1, 2]), 1, None).unwrap_err();
        assert_eq!(error, MatrixError::TruncatedBuffer(3));
        assert!(error.is_recoverable());
    }
}
