//! Vector math and serialization for the similarity index.
//!
//! Pure helpers shared by the file-backed vector store in the app crate:
//! Euclidean distance for nearest-neighbor ranking, and a little-endian
//! f32 codec for on-disk persistence.

/// Encode a float vector as little-endian f32 bytes.
///
/// Each `f32` is stored as 4 bytes in little-endian order, producing
/// `vec.len() × 4` bytes.
///
/// # Example
///
/// ```rust
/// use reforge_core::vector::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12); // 3 × 4 bytes
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes back into a float vector.
///
/// Reverses [`vec_to_blob`]: reads 4-byte little-endian `f32` values
/// from the byte slice.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute the Euclidean (L2) distance between two embedding vectors.
///
/// Lower means more similar; `0.0` means identical. Returns
/// `f32::INFINITY` for vectors of different lengths, so a malformed
/// candidate sorts last instead of ranking spuriously well.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        let blob = vec_to_blob(&vec);
        let restored = blob_to_vec(&blob);
        assert_eq!(vec, restored);
    }

    #[test]
    fn test_distance_identical_is_zero() {
        let v = vec![1.0, 2.0, 3.0];
        let d = euclidean_distance(&v, &v);
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn test_distance_unit_axes() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let d = euclidean_distance(&a, &b);
        assert!((d - std::f32::consts::SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_distance_orders_by_closeness() {
        let query = vec![1.0, 1.0];
        let near = vec![1.0, 1.1];
        let far = vec![5.0, -3.0];
        assert!(euclidean_distance(&query, &near) < euclidean_distance(&query, &far));
    }

    #[test]
    fn test_distance_different_lengths_is_infinite() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0];
        assert_eq!(euclidean_distance(&a, &b), f32::INFINITY);
    }

    #[test]
    fn test_distance_empty_vectors() {
        let d = euclidean_distance(&[], &[]);
        assert_eq!(d, 0.0);
    }
}
