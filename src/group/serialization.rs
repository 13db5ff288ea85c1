//! Serialization and deserialization utilities for group elements and scalars.
//!
//! Group elements use their canonical compressed encoding, scalars their
//! canonical representation in big-endian byte order. Both ends of a link must
//! agree on the group for the bytes to be meaningful.

use alloc::vec::Vec;
use ff::PrimeField;
use group::prime::PrimeGroup;

/// Get the serialized length of a group element in bytes.
pub fn group_elt_serialized_len<G: PrimeGroup>() -> usize {
    G::Repr::default().as_ref().len()
}

/// Get the serialized length of a scalar in bytes.
pub fn scalar_serialized_len<F: PrimeField>() -> usize {
    F::Repr::default().as_ref().len()
}

/// Splits `len` bytes off the front of `data`, advancing it.
fn take<'a>(data: &mut &'a [u8], len: usize) -> Option<&'a [u8]> {
    let current: &'a [u8] = *data;
    let (head, rest) = current.split_at_checked(len)?;
    *data = rest;
    Some(head)
}

/// Serialize a slice of group elements into a byte vector.
///
/// # Returns
/// - A `Vec<u8>` containing the concatenated canonical compressed byte representations.
pub fn serialize_elements<'a, G: PrimeGroup>(elements: impl IntoIterator<Item = &'a G>) -> Vec<u8> {
    let mut bytes = Vec::new();
    for element in elements {
        bytes.extend_from_slice(element.to_bytes().as_ref());
    }
    bytes
}

/// Deserialize `count` group elements from the front of `data`, advancing it.
///
/// # Returns
/// - `Some(Vec<G>)`: The deserialized group elements if all are valid.
/// - `None`: If `data` is too short or any element is not a canonical encoding.
pub fn deserialize_elements<G: PrimeGroup>(data: &mut &[u8], count: usize) -> Option<Vec<G>> {
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        let mut repr = G::Repr::default();
        let slice = take(data, repr.as_ref().len())?;
        repr.as_mut().copy_from_slice(slice);

        let element: Option<G> = G::from_bytes(&repr).into();
        elements.push(element?);
    }
    Some(elements)
}

/// Serialize a slice of scalar field elements into a byte vector.
///
/// # Returns
/// - A `Vec<u8>` containing the scalar bytes in big-endian order.
pub fn serialize_scalars<F: PrimeField>(scalars: &[F]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(scalars.len() * scalar_serialized_len::<F>());
    for scalar in scalars {
        let mut scalar_bytes = scalar.to_repr().as_ref().to_vec();
        scalar_bytes.reverse();
        bytes.extend_from_slice(&scalar_bytes);
    }
    bytes
}

/// Deserialize `count` scalars from the front of `data`, advancing it.
///
/// # Returns
/// - `Some(Vec<F>)`: The deserialized scalars if all are valid.
/// - `None`: If `data` is too short or any scalar is not canonical.
pub fn deserialize_scalars<F: PrimeField>(data: &mut &[u8], count: usize) -> Option<Vec<F>> {
    let mut scalars = Vec::with_capacity(count);
    for _ in 0..count {
        let mut repr = F::Repr::default();
        let slice = take(data, repr.as_ref().len())?;
        repr.as_mut().copy_from_slice(slice);
        repr.as_mut().reverse();

        scalars.push(F::from_repr_vartime(repr)?);
    }
    Some(scalars)
}

/// Deserialize a fixed-size byte string from the front of `data`, advancing it.
pub fn deserialize_bytes<const N: usize>(data: &mut &[u8]) -> Option<[u8; N]> {
    let slice = take(data, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Some(out)
}
