//! Typed, self-sized buffers that move between ranks.
//!
//! A [`Payload`] always knows its own element count, so nothing downstream
//! reconstructs sizes from context. It crosses a channel only through the
//! length-prefixed frame produced by [`Payload::to_frame`].

use crate::error::Result;
use crate::protocol::{decode_frame, encode_frame};
use crate::types::{DataType, Element};

/// A flat buffer of fixed-width elements owned by exactly one rank at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload<T: Element> {
    elems: Vec<T>,
}

impl<T: Element> Payload<T> {
    pub fn new(elems: Vec<T>) -> Self {
        Self { elems }
    }

    /// A payload of `count` copies of `fill`, typically a receive buffer.
    pub fn filled(fill: T, count: usize) -> Self {
        Self {
            elems: vec![fill; count],
        }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn dtype(&self) -> DataType {
        T::DTYPE
    }

    /// Size of the element data in bytes (header excluded).
    pub fn len_bytes(&self) -> usize {
        self.elems.len() * T::WIDTH
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elems
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.elems
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elems
    }

    /// Append another payload's elements after this one's.
    pub fn extend_from(&mut self, other: Payload<T>) {
        self.elems.extend(other.elems);
    }

    /// Overwrite contents with `src`, which must have the same length.
    pub(crate) fn overwrite(&mut self, src: Vec<T>) {
        debug_assert_eq!(self.elems.len(), src.len());
        self.elems = src;
    }

    pub fn to_frame(&self) -> Result<Vec<u8>> {
        encode_frame(&self.elems)
    }

    pub fn from_frame(buf: &[u8]) -> Result<Self> {
        decode_frame(buf).map(Self::new)
    }
}

impl<T: Element> From<Vec<T>> for Payload<T> {
    fn from(elems: Vec<T>) -> Self {
        Self::new(elems)
    }
}

impl<T: Element> std::fmt::Display for Payload<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Payload<{}>({} elems)", T::DTYPE, self.elems.len())
    }
}
