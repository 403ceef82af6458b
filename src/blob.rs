//! Blob codec
//!
//! Feature tables store a matrix as three columns: `rows`, `cols` and a
//! `data` blob holding `rows * cols` little-endian `f32` cells in row-major
//! order. This module turns those triples into `ndarray` matrices and maps
//! the matrices into keypoints or 8-bit descriptors.

use ndarray::Array2;
use crate::types::Keypoint;
use crate::{Error, Result};

/// Bytes per stored cell (`f32`)
pub const CELL_SIZE: usize = std::mem::size_of::<f32>();

/// Number of columns a keypoint matrix must have to be read as locations
pub const KEYPOINT_COLS: usize = 2;

/// A `rows`/`cols`/`data` triple as read from a feature table
#[derive(Debug, Clone, PartialEq)]
pub struct BlobRow {
    pub rows: i64,
    pub cols: i64,
    pub data: Vec<u8>,
}

impl BlobRow {
    /// Decode this row into an `f32` matrix
    pub fn decode(&self) -> Result<Array2<f32>> {
        decode_matrix(self.rows, self.cols, &self.data)
    }
}

/// Decode a blob into a row-major `f32` matrix.
///
/// Fails with [`Error::CorruptBlob`] when the dimensions are negative or the
/// payload length is not exactly `rows * cols * 4`.
pub fn decode_matrix(rows: i64, cols: i64, bytes: &[u8]) -> Result<Array2<f32>> {
    let corrupt = |expected: usize| Error::CorruptBlob {
        rows,
        cols,
        expected,
        actual: bytes.len(),
    };

    let (Ok(r), Ok(c)) = (usize::try_from(rows), usize::try_from(cols)) else {
        return Err(corrupt(0));
    };
    let expected = r
        .checked_mul(c)
        .and_then(|n| n.checked_mul(CELL_SIZE))
        .ok_or_else(|| corrupt(usize::MAX))?;
    if bytes.len() != expected {
        return Err(corrupt(expected));
    }

    let cells: Vec<f32> = bytes
        .chunks_exact(CELL_SIZE)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Array2::from_shape_vec((r, c), cells).map_err(|_| corrupt(expected))
}

/// Decode an optional row; a missing row becomes a 0x0 matrix.
pub fn decode_optional(row: Option<BlobRow>) -> Result<Array2<f32>> {
    match row {
        Some(row) => row.decode(),
        None => Ok(Array2::zeros((0, 0))),
    }
}

/// Flatten a matrix into the blob layout understood by [`decode_matrix`]
pub fn encode_matrix(matrix: &Array2<f32>) -> Vec<u8> {
    matrix.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Map a two-column matrix into keypoints, one per row, in row order.
///
/// An empty (0x0) matrix gives no keypoints. Any other column count is a
/// [`Error::ShapeMismatch`].
pub fn keypoints_from_matrix(matrix: &Array2<f32>) -> Result<Vec<Keypoint>> {
    if matrix.is_empty() {
        return Ok(Vec::new());
    }
    if matrix.ncols() != KEYPOINT_COLS {
        return Err(Error::ShapeMismatch {
            expected: KEYPOINT_COLS,
            actual: matrix.ncols(),
        });
    }

    Ok(matrix
        .rows()
        .into_iter()
        .map(|row| Keypoint::new(row[0], row[1]))
        .collect())
}

/// Narrow a descriptor matrix to 8 bits per cell.
///
/// Cells are rounded to the nearest integer and saturated to `[0, 255]`;
/// NaN becomes 0.
pub fn descriptors_from_matrix(matrix: &Array2<f32>) -> Array2<u8> {
    matrix.mapv(|v| v.round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn floats_to_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_row_major() {
        let bytes = floats_to_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let matrix = decode_matrix(3, 2, &bytes).unwrap();

        assert_eq!(matrix.dim(), (3, 2));
        assert_eq!(matrix, array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
    }

    #[test]
    fn test_decode_length_mismatch() {
        let bytes = floats_to_bytes(&[1.0, 2.0, 3.0]);
        let err = decode_matrix(2, 2, &bytes).unwrap_err();

        match err {
            Error::CorruptBlob { expected, actual, .. } => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 12);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_negative_dims() {
        assert!(matches!(
            decode_matrix(-1, 2, &[]),
            Err(Error::CorruptBlob { .. })
        ));
    }

    #[test]
    fn test_decode_missing_row() {
        let matrix = decode_optional(None).unwrap();
        assert_eq!(matrix.dim(), (0, 0));
    }

    #[test]
    fn test_round_trip_exact() {
        let matrix = array![[0.1f32, -2.5, f32::MAX], [1e-7, 42.0, -0.0]];
        let bytes = encode_matrix(&matrix);
        assert_eq!(bytes.len(), 6 * CELL_SIZE);

        let decoded = decode_matrix(2, 3, &bytes).unwrap();
        for (a, b) in matrix.iter().zip(decoded.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_keypoints_from_two_columns() {
        let matrix = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let kps = keypoints_from_matrix(&matrix).unwrap();

        assert_eq!(
            kps,
            vec![Keypoint::new(1.0, 2.0), Keypoint::new(3.0, 4.0), Keypoint::new(5.0, 6.0)]
        );
        assert!(kps.iter().all(|kp| kp.size == 1.0));
    }

    #[test]
    fn test_keypoints_wrong_columns() {
        let matrix = array![[1.0, 2.0, 3.0]];
        let err = keypoints_from_matrix(&matrix).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_descriptors_narrowing() {
        let matrix = Array2::from_elem((2, 4), 10.0f32);
        let des = descriptors_from_matrix(&matrix);
        assert_eq!(des, Array2::from_elem((2, 4), 10u8));

        let edge = array![[-3.0f32, 255.4, 300.0, f32::NAN, 127.5]];
        assert_eq!(descriptors_from_matrix(&edge), array![[0u8, 255, 255, 0, 128]]);
    }
}
