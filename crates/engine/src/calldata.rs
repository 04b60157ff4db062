//! Word-oriented calldata codec.
//!
//! Calldata is a 4-byte [`Selector`] followed by 32-byte argument words.
//! Scalars occupy one word. Strings and arrays are a length word followed by
//! their items (strings padded to whole words).

use rexec_primitives::{Address, Selector, Word, ADDRESS_SIZE, SELECTOR_SIZE, WORD_SIZE};
use thiserror::Error;

use crate::exception::{reasons, ApplicationException};

/// Argument decoding failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of calldata: need {needed} bytes, {available} available")]
    UnexpectedEnd { needed: usize, available: usize },

    #[error("word does not hold an address")]
    InvalidAddress,

    #[error("integer does not fit in {bits} bits")]
    IntegerOverflow { bits: u32 },

    #[error("word is not a boolean")]
    InvalidBool,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("{0} trailing bytes after arguments")]
    TrailingBytes(usize),

    #[error("length prefix overflows")]
    LengthOverflow,
}

impl From<DecodeError> for ApplicationException {
    fn from(_: DecodeError) -> Self {
        ApplicationException::new(reasons::DEFAULT_EXCEPTION)
    }
}

/// Builds calldata for one call.
///
/// ```rust
/// use rexec_engine::{ArgReader, CalldataBuilder};
/// use rexec_primitives::Selector;
///
/// let selector = Selector::from_signature("setCount(uint256)");
/// let calldata = CalldataBuilder::new(selector).uint(7).build();
/// assert_eq!(calldata.len(), 36);
///
/// let mut args = ArgReader::new(&calldata[4..]);
/// assert_eq!(args.uint().unwrap(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct CalldataBuilder {
    data: Vec<u8>,
}

impl CalldataBuilder {
    pub fn new(selector: Selector) -> Self {
        let mut data = Vec::with_capacity(SELECTOR_SIZE + 4 * WORD_SIZE);
        data.extend_from_slice(selector.as_bytes());
        Self { data }
    }

    /// Starts from a function signature such as `"buy()"`.
    pub fn signature(signature: &str) -> Self {
        Self::new(Selector::from_signature(signature))
    }

    pub fn word(mut self, word: Word) -> Self {
        self.data.extend_from_slice(word.as_bytes());
        self
    }

    pub fn address(self, address: Address) -> Self {
        self.word(Word::from(address))
    }

    pub fn uint(self, value: u128) -> Self {
        self.word(Word::from(value))
    }

    pub fn boolean(self, value: bool) -> Self {
        self.word(Word::from(value))
    }

    /// Length word, then the bytes zero-padded to a multiple of 32.
    pub fn bytes(mut self, value: &[u8]) -> Self {
        self = self.uint(value.len() as u128);
        for chunk in value.chunks(WORD_SIZE) {
            let mut padded = [0u8; WORD_SIZE];
            padded[..chunk.len()].copy_from_slice(chunk);
            self.data.extend_from_slice(&padded);
        }
        self
    }

    pub fn string(self, value: &str) -> Self {
        self.bytes(value.as_bytes())
    }

    pub fn addresses(self, values: &[Address]) -> Self {
        values
            .iter()
            .fold(self.uint(values.len() as u128), |builder, address| {
                builder.address(*address)
            })
    }

    pub fn uints(self, values: &[u128]) -> Self {
        values
            .iter()
            .fold(self.uint(values.len() as u128), |builder, value| {
                builder.uint(*value)
            })
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// Decodes the argument words that follow a selector.
#[derive(Debug, Clone)]
pub struct ArgReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ArgReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn word(&mut self) -> Result<Word, DecodeError> {
        let raw = self.take(WORD_SIZE)?;
        let mut bytes = [0u8; WORD_SIZE];
        bytes.copy_from_slice(raw);
        Ok(Word::from_array(bytes))
    }

    pub fn address(&mut self) -> Result<Address, DecodeError> {
        let word = self.word()?;
        if word.as_bytes()[..WORD_SIZE - ADDRESS_SIZE].iter().any(|b| *b != 0) {
            return Err(DecodeError::InvalidAddress);
        }
        Ok(word.as_address())
    }

    pub fn uint(&mut self) -> Result<u128, DecodeError> {
        self.word()?
            .as_u128()
            .ok_or(DecodeError::IntegerOverflow { bits: 128 })
    }

    pub fn uint64(&mut self) -> Result<u64, DecodeError> {
        u64::try_from(self.uint()?).map_err(|_| DecodeError::IntegerOverflow { bits: 64 })
    }

    pub fn boolean(&mut self) -> Result<bool, DecodeError> {
        match self.uint() {
            Ok(0) => Ok(false),
            Ok(1) => Ok(true),
            _ => Err(DecodeError::InvalidBool),
        }
    }

    pub fn bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.length()?;
        let padded = len
            .checked_add(WORD_SIZE - 1)
            .map(|n| n / WORD_SIZE * WORD_SIZE)
            .ok_or(DecodeError::LengthOverflow)?;
        let raw = self.take(padded)?;
        Ok(raw[..len].to_vec())
    }

    pub fn string(&mut self) -> Result<String, DecodeError> {
        String::from_utf8(self.bytes()?).map_err(|_| DecodeError::InvalidUtf8)
    }

    pub fn addresses(&mut self) -> Result<Vec<Address>, DecodeError> {
        let len = self.array_length()?;
        (0..len).map(|_| self.address()).collect()
    }

    pub fn uints(&mut self) -> Result<Vec<u128>, DecodeError> {
        let len = self.array_length()?;
        (0..len).map(|_| self.uint()).collect()
    }

    /// Fails unless every byte was consumed.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(DecodeError::TrailingBytes(extra)),
        }
    }

    fn length(&mut self) -> Result<usize, DecodeError> {
        usize::try_from(self.uint()?).map_err(|_| DecodeError::LengthOverflow)
    }

    /// Array length, bounded by the words actually present.
    fn array_length(&mut self) -> Result<usize, DecodeError> {
        let len = self.length()?;
        let needed = len.checked_mul(WORD_SIZE).ok_or(DecodeError::LengthOverflow)?;
        if needed > self.remaining() {
            return Err(DecodeError::UnexpectedEnd {
                needed,
                available: self.remaining(),
            });
        }
        Ok(len)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if len > available {
            return Err(DecodeError::UnexpectedEnd {
                needed: len,
                available,
            });
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }
}
