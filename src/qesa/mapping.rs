//! Compatible commitments and the copy mapping.
//!
//! Independent parties commit to message vectors under subsets of the CRS
//! generators:
//!
//! 1. [`get_commitment_crs`] selects (and validates) the generator indices of a
//!    commitment configuration.
//! 2. [`commit`] computes `Σ m_i·g[k_i] + r·h` under such a configuration.
//! 3. [`compute_mapping`] lays the committed messages out next to the witness
//!    of a copy argument, in the order the commitments were produced.
//!
//! The copy argument later folds all commitments into the commitment of its
//! extended witness. Generator index `k` then carries one combined value for
//! every message committed under `g[k]`, which is why the mapping groups
//! messages by key ([`Mapping::messages_for_key`]).

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::vec::Vec;

use group::prime::PrimeGroup;
use sha3::{Digest, Sha3_256};
use tracing::instrument;

use crate::crs::Crs;
use crate::errors::{Error, InvalidInstance};
use crate::group::msm::MultiScalarMul;

const MAPPING_DOMAIN: &[u8] = b"qesa-proofs/copy-mapping/v1";

/// The generator indices one commitment configuration commits under.
///
/// Only [`get_commitment_crs`] creates these, so the indices are always
/// non-empty, pairwise distinct and within the range of the CRS they were
/// selected from.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitmentCrs(Vec<u32>);

impl CommitmentCrs {
    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    /// Length of the messages committed under this configuration.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Selects the generators `g[i]` for `i` in `generator_indices` as a commitment configuration.
///
/// Example: indices `[0, 2]` commit to 2-element messages with `g[0]` and `g[2]`.
///
/// Any index is accepted here, but a copy proof over a witness of size `n`
/// needs every index to be at least `n`: [`compute_mapping`] rejects a
/// configuration that selects a witness position.
///
/// # Errors
/// - [`Error::GeneratorOutOfRange`] if an index is not below `crs.len()`.
/// - [`Error::InvalidInstance`] if the list is empty or repeats an index.
pub fn get_commitment_crs<G: PrimeGroup>(
    crs: &Crs<G>,
    generator_indices: &[u32],
) -> Result<CommitmentCrs, Error> {
    if generator_indices.is_empty() {
        return Err(InvalidInstance::new("a commitment configuration needs at least one generator").into());
    }
    let mut seen = BTreeSet::new();
    for &index in generator_indices {
        if index as usize >= crs.len() {
            return Err(Error::GeneratorOutOfRange {
                index,
                size: crs.len(),
            });
        }
        if !seen.insert(index) {
            return Err(InvalidInstance::new(format!("generator index {index} selected twice")).into());
        }
    }
    Ok(CommitmentCrs(generator_indices.to_vec()))
}

/// Commits to `message` under `crs_com` with blinding `blinding`.
///
/// Deterministic: the same inputs always give the same group element.
/// Commitments meant for a copy proof must use a configuration that
/// [`compute_mapping`] accepts, see [`get_commitment_crs`].
///
/// # Errors
/// - [`Error::InvalidInstance`] if `message.len() != crs_com.len()`.
/// - [`Error::GeneratorOutOfRange`] if `crs_com` was selected from a larger CRS.
pub fn commit<G: PrimeGroup>(
    crs: &Crs<G>,
    crs_com: &CommitmentCrs,
    message: &[G::Scalar],
    blinding: &G::Scalar,
) -> Result<G, Error> {
    if message.len() != crs_com.len() {
        return Err(InvalidInstance::new("message length does not match the commitment configuration").into());
    }
    let bases = crs_com
        .indices()
        .iter()
        .map(|&index| {
            crs.generators()
                .get(index as usize)
                .copied()
                .ok_or(Error::GeneratorOutOfRange {
                    index,
                    size: crs.len(),
                })
        })
        .collect::<Result<Vec<G>, Error>>()?;
    Ok(G::msm(message, &bases) + *crs.blinding() * blinding)
}

/// Where every committed message value lives inside the extended witness of a
/// copy argument.
///
/// A *message* here is one scalar of one committed vector. Messages are numbered
/// globally, in the order the commitments were presented to [`compute_mapping`].
///
/// Prover and verifier must use equal mappings; [`Mapping::digest`] binds a
/// mapping to the exact inputs it was computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    witness_size: u32,
    num_crs: u32,
    crs_set: Vec<CommitmentCrs>,
    crs_id_for_commitment: Vec<u32>,
    key_position_for_message: BTreeMap<u32, u32>,
    msg_id_to_msg_position: BTreeMap<u32, u32>,
    crs_id_for_message: BTreeMap<u32, u32>,
    commitment_for_message: BTreeMap<u32, u32>,
    unique_key_indices: BTreeSet<u32>,
    messages_for_key: BTreeMap<u32, Vec<u32>>,
    last_index: u32,
    digest: [u8; 32],
}

impl Mapping {
    /// Length of the witness proper, constant position 0 included.
    pub fn witness_size(&self) -> u32 {
        self.witness_size
    }

    /// Number of distinct commitment configurations.
    pub fn num_crs(&self) -> u32 {
        self.num_crs
    }

    /// Number of commitments, one per entry of the list given to [`compute_mapping`].
    pub fn num_commitments(&self) -> usize {
        self.crs_id_for_commitment.len()
    }

    /// Number of committed message values across all commitments.
    pub fn num_messages(&self) -> usize {
        self.key_position_for_message.len()
    }

    /// The distinct configurations, indexed by configuration id.
    pub fn crs_set(&self) -> &[CommitmentCrs] {
        &self.crs_set
    }

    /// The configuration commitment `j` was made under.
    pub fn commitment_crs(&self, commitment: usize) -> Option<&CommitmentCrs> {
        let id = *self.crs_id_for_commitment.get(commitment)?;
        self.crs_set.get(id as usize)
    }

    /// Message id → witness position holding its opened value.
    pub fn key_position_for_message(&self) -> &BTreeMap<u32, u32> {
        &self.key_position_for_message
    }

    /// Message id → index of the message inside its committed vector.
    pub fn msg_id_to_msg_position(&self) -> &BTreeMap<u32, u32> {
        &self.msg_id_to_msg_position
    }

    /// Message id → configuration id.
    pub fn crs_id_for_message(&self) -> &BTreeMap<u32, u32> {
        &self.crs_id_for_message
    }

    /// Message id → index of the commitment it belongs to.
    pub fn commitment_for_message(&self) -> &BTreeMap<u32, u32> {
        &self.commitment_for_message
    }

    /// Every generator index used by some configuration, each once.
    pub fn unique_key_indices(&self) -> &BTreeSet<u32> {
        &self.unique_key_indices
    }

    /// Generator index → messages committed under it, in message order.
    pub fn messages_for_key(&self) -> &BTreeMap<u32, Vec<u32>> {
        &self.messages_for_key
    }

    /// One past the highest witness position in use.
    pub fn last_index(&self) -> u32 {
        self.last_index
    }

    /// SHA3-256 over the witness size and the ordered configuration list.
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Iterates `(message id, witness position, commitment, position in commitment)`.
    pub(crate) fn slots(&self) -> impl Iterator<Item = (u32, usize, usize, usize)> + '_ {
        self.key_position_for_message.iter().map(move |(&id, &position)| {
            (
                id,
                position as usize,
                self.commitment_for_message[&id] as usize,
                self.msg_id_to_msg_position[&id] as usize,
            )
        })
    }
}

/// Finds the first block `[begin, begin + len)` at or after `start` that avoids every key.
fn free_block(start: u32, len: u32, keys: &BTreeSet<u32>) -> Option<u32> {
    let mut begin = start;
    loop {
        let end = begin.checked_add(len)?;
        match keys.range(begin..end).next_back() {
            Some(&key) => begin = key.checked_add(1)?,
            None => return Some(begin),
        }
    }
}

fn mapping_digest(witness_size: u32, com_crs_set: &[CommitmentCrs]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(MAPPING_DOMAIN);
    hasher.update(witness_size.to_le_bytes());
    hasher.update((com_crs_set.len() as u64).to_le_bytes());
    for crs_com in com_crs_set {
        hasher.update((crs_com.len() as u64).to_le_bytes());
        for index in crs_com.indices() {
            hasher.update(index.to_le_bytes());
        }
    }
    hasher.finalize().into()
}

/// Computes the copy mapping for a witness of `witness_size` scalars and the
/// commitments made under `com_crs_set`, listed in the order they were produced.
/// A configuration used for several commitments appears several times.
///
/// Layout of the extended witness:
/// - `[0, witness_size)`: the witness; position 0 holds the constant 1.
/// - after that, one contiguous block per commitment, in order, skipping any
///   position that is itself a generator index of some configuration.
///
/// The result depends on nothing but the arguments, so prover and verifier
/// compute equal mappings from equal inputs.
///
/// # Errors
/// - [`Error::InvalidInstance`] if `witness_size` is zero, a generator index
///   falls inside the witness, or the layout does not fit the CRS.
/// - [`Error::GeneratorOutOfRange`] if a configuration does not fit `crs`.
#[instrument(skip_all, fields(witness_size = witness_size, commitments = com_crs_set.len()))]
pub fn compute_mapping<G: PrimeGroup>(
    crs: &Crs<G>,
    witness_size: u32,
    com_crs_set: &[CommitmentCrs],
) -> Result<Mapping, Error> {
    if witness_size == 0 {
        return Err(InvalidInstance::new("witness_size must be at least 1, position 0 holds the constant 1").into());
    }

    let mut unique_key_indices = BTreeSet::new();
    for &key in com_crs_set.iter().flat_map(CommitmentCrs::indices) {
        if key as usize >= crs.len() {
            return Err(Error::GeneratorOutOfRange {
                index: key,
                size: crs.len(),
            });
        }
        if key < witness_size {
            return Err(InvalidInstance::new(format!(
                "generator index {key} overlaps the witness positions [0, {witness_size})"
            ))
            .into());
        }
        unique_key_indices.insert(key);
    }

    let mut crs_ids: BTreeMap<&CommitmentCrs, u32> = BTreeMap::new();
    let mut crs_set = Vec::new();
    let mut crs_id_for_commitment = Vec::with_capacity(com_crs_set.len());
    let mut key_position_for_message = BTreeMap::new();
    let mut msg_id_to_msg_position = BTreeMap::new();
    let mut crs_id_for_message = BTreeMap::new();
    let mut commitment_for_message = BTreeMap::new();
    let mut messages_for_key: BTreeMap<u32, Vec<u32>> = BTreeMap::new();

    let too_large = || InvalidInstance::new("copy layout overflows the index space");
    let mut cursor = witness_size;
    let mut msg_id = 0u32;
    for (commitment, crs_com) in (0u32..).zip(com_crs_set) {
        let crs_id = *crs_ids.entry(crs_com).or_insert_with(|| {
            crs_set.push(crs_com.clone());
            (crs_set.len() - 1) as u32
        });
        crs_id_for_commitment.push(crs_id);

        let len = u32::try_from(crs_com.len()).map_err(|_| too_large())?;
        let start = free_block(cursor, len, &unique_key_indices).ok_or_else(too_large)?;
        for (&key, offset) in crs_com.indices().iter().zip(0u32..) {
            key_position_for_message.insert(msg_id, start + offset);
            msg_id_to_msg_position.insert(msg_id, offset);
            crs_id_for_message.insert(msg_id, crs_id);
            commitment_for_message.insert(msg_id, commitment);
            messages_for_key.entry(key).or_default().push(msg_id);
            msg_id += 1;
        }
        cursor = start + len;
    }

    let last_index = cursor;
    if last_index as usize > crs.len() {
        return Err(InvalidInstance::new(format!(
            "copy layout needs {last_index} positions but the CRS has {} generators",
            crs.len()
        ))
        .into());
    }

    Ok(Mapping {
        witness_size,
        num_crs: crs_set.len() as u32,
        crs_set,
        crs_id_for_commitment,
        key_position_for_message,
        msg_id_to_msg_position,
        crs_id_for_message,
        commitment_for_message,
        unique_key_indices,
        messages_for_key,
        last_index,
        digest: mapping_digest(witness_size, com_crs_set),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bls12_381::{G1Projective as G, Scalar};
    use ff::Field;
    use rand::thread_rng;

    fn crs(size: usize) -> Crs<G> {
        Crs::random(size, &mut thread_rng())
    }

    #[test]
    fn commitment_crs_validation() {
        let crs = crs(8);
        assert_eq!(
            get_commitment_crs(&crs, &[1, 7]).unwrap().indices(),
            &[1, 7]
        );
        assert_eq!(
            get_commitment_crs(&crs, &[8]),
            Err(Error::GeneratorOutOfRange { index: 8, size: 8 })
        );
        assert!(get_commitment_crs(&crs, &[]).is_err());
        assert!(get_commitment_crs(&crs, &[3, 3]).is_err());
    }

    #[test]
    fn commit_matches_the_definition() {
        let crs = crs(6);
        let crs_com = get_commitment_crs(&crs, &[5, 2]).unwrap();
        let m = [Scalar::from(3u64), Scalar::from(4u64)];
        let r = Scalar::from(9u64);
        let expected = crs.generators()[5] * m[0] + crs.generators()[2] * m[1] + *crs.blinding() * r;
        assert_eq!(commit(&crs, &crs_com, &m, &r).unwrap(), expected);
        assert!(commit(&crs, &crs_com, &m[..1], &r).is_err());
    }

    #[test]
    fn commitment_from_a_larger_crs_is_rejected() {
        let large = crs(10);
        let small = crs(4);
        let crs_com = get_commitment_crs(&large, &[9]).unwrap();
        assert_eq!(
            commit(&small, &crs_com, &[Scalar::ONE], &Scalar::ONE),
            Err(Error::GeneratorOutOfRange { index: 9, size: 4 })
        );
    }

    #[test]
    fn blocks_skip_key_positions() {
        let crs = crs(16);
        // keys 4 and 6 sit right after a witness of size 3
        let a = get_commitment_crs(&crs, &[4, 6]).unwrap();
        let b = get_commitment_crs(&crs, &[12]).unwrap();
        let mapping = compute_mapping(&crs, 3, &[a.clone(), b, a]).unwrap();

        // first block [3, 5) hits key 4, so it moves to [7, 9)
        let positions: Vec<u32> = mapping.key_position_for_message().values().copied().collect();
        assert_eq!(positions, vec![7, 8, 9, 10, 11]);
        assert_eq!(mapping.last_index(), 12);
        assert_eq!(mapping.num_crs(), 2);
        assert_eq!(mapping.num_commitments(), 3);
        assert_eq!(mapping.crs_id_for_message()[&4], 0);
        assert_eq!(mapping.commitment_for_message()[&4], 2);
        assert_eq!(mapping.msg_id_to_msg_position()[&4], 1);
        assert_eq!(mapping.messages_for_key()[&6], vec![1, 4]);

        for (_, position, _, _) in mapping.slots() {
            assert!(!mapping.unique_key_indices().contains(&(position as u32)));
        }
    }

    #[test]
    fn empty_commitment_list() {
        let crs = crs(4);
        let mapping = compute_mapping(&crs, 4, &[]).unwrap();
        assert_eq!(mapping.last_index(), 4);
        assert_eq!(mapping.num_messages(), 0);
        assert!(mapping.unique_key_indices().is_empty());
    }

    #[test]
    fn invalid_layouts() {
        let crs = crs(8);
        let low = get_commitment_crs(&crs, &[1]).unwrap();
        assert!(compute_mapping(&crs, 0, &[]).is_err());
        // key inside the witness
        assert!(compute_mapping(&crs, 2, &[low]).is_err());
        // three messages need positions 5..8 but key 7 forces them past the CRS
        let wide = get_commitment_crs(&crs, &[5, 6, 7]).unwrap();
        assert!(compute_mapping(&crs, 5, &[wide]).is_err());
    }

    #[test]
    fn digest_depends_on_order() {
        let crs = crs(16);
        let a = get_commitment_crs(&crs, &[10]).unwrap();
        let b = get_commitment_crs(&crs, &[11, 12]).unwrap();
        let ab = compute_mapping(&crs, 3, &[a.clone(), b.clone()]).unwrap();
        let ba = compute_mapping(&crs, 3, &[b, a]).unwrap();
        assert_ne!(ab.digest(), ba.digest());
    }
}
