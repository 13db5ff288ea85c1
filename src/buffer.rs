//! Protocol messages.
//!
//! A [`Message`] is the only thing that travels between prover and verifier.
//! Step functions take the incoming message by value and return a freshly built
//! outgoing one, so an output can never contain stale bytes from a previous
//! round. [`MessageWriter`] and [`MessageReader`] encode the group elements and
//! scalars of one round in order. Layered arguments forward the messages of the
//! layer below unchanged once their own rounds are done.

use alloc::vec::Vec;

use ff::PrimeField;
use group::prime::PrimeGroup;

use crate::errors::Error;
use crate::group::serialization::{
    deserialize_bytes, deserialize_elements, deserialize_scalars, serialize_elements,
    serialize_scalars,
};

/// An owned protocol message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message(Vec<u8>);

impl Message {
    /// The empty message, received by a prover on its first step.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Message {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Builds an outgoing [`Message`].
#[derive(Debug, Default)]
pub struct MessageWriter {
    bytes: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element<G: PrimeGroup>(&mut self, element: &G) -> &mut Self {
        self.bytes.extend_from_slice(element.to_bytes().as_ref());
        self
    }

    pub fn elements<G: PrimeGroup>(&mut self, elements: &[G]) -> &mut Self {
        self.bytes.extend(serialize_elements(elements));
        self
    }

    pub fn scalar<F: PrimeField>(&mut self, scalar: &F) -> &mut Self {
        self.scalars(core::slice::from_ref(scalar))
    }

    pub fn scalars<F: PrimeField>(&mut self, scalars: &[F]) -> &mut Self {
        self.bytes.extend(serialize_scalars(scalars));
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn finish(self) -> Message {
        Message(self.bytes)
    }
}

/// Decodes an incoming [`Message`] front to back.
///
/// Every decoding failure maps to [`Error::MalformedMessage`].
#[derive(Debug)]
pub struct MessageReader<'a> {
    data: &'a [u8],
}

impl<'a> MessageReader<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self {
            data: message.as_bytes(),
        }
    }

    pub fn element<G: PrimeGroup>(&mut self) -> Result<G, Error> {
        let mut elements = self.elements::<G>(1)?;
        elements.pop().ok_or(Error::MalformedMessage)
    }

    pub fn elements<G: PrimeGroup>(&mut self, count: usize) -> Result<Vec<G>, Error> {
        deserialize_elements(&mut self.data, count).ok_or(Error::MalformedMessage)
    }

    pub fn scalar<F: PrimeField>(&mut self) -> Result<F, Error> {
        let mut scalars = self.scalars::<F>(1)?;
        scalars.pop().ok_or(Error::MalformedMessage)
    }

    pub fn scalars<F: PrimeField>(&mut self, count: usize) -> Result<Vec<F>, Error> {
        deserialize_scalars(&mut self.data, count).ok_or(Error::MalformedMessage)
    }

    pub fn digest<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        deserialize_bytes(&mut self.data).ok_or(Error::MalformedMessage)
    }

    /// Succeeds only if every byte was consumed.
    pub fn finish(self) -> Result<(), Error> {
        if self.data.is_empty() {
            Ok(())
        } else {
            Err(Error::MalformedMessage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bls12_381::{G1Projective as G, Scalar};

    #[test]
    fn writer_and_reader_agree_on_layout() {
        let mut writer = MessageWriter::new();
        writer
            .bytes(&[9u8; 4])
            .element(&G::generator())
            .scalars(&[Scalar::from(5u64), Scalar::from(6u64)]);
        let message = writer.finish();

        let mut reader = MessageReader::new(&message);
        assert_eq!(reader.digest::<4>().unwrap(), [9u8; 4]);
        assert_eq!(reader.element::<G>().unwrap(), G::generator());
        assert_eq!(reader.scalar::<Scalar>().unwrap(), Scalar::from(5u64));
        assert_eq!(reader.scalar::<Scalar>().unwrap(), Scalar::from(6u64));
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn trailing_bytes_are_reported() {
        let mut writer = MessageWriter::new();
        writer.scalar(&Scalar::from(1u64)).bytes(&[0]);
        let message = writer.finish();

        let mut reader = MessageReader::new(&message);
        reader.scalar::<Scalar>().unwrap();
        assert_eq!(reader.finish(), Err(Error::MalformedMessage));
    }
}
