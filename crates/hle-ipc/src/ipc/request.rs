//! Inbound command buffers and typed parameter decoding.
//!
//! The transport delivers the raw command buffer words together with the
//! payloads of any static buffers it has already copied out of guest memory.
//! [`RequestParser`] walks the normal parameters first and then the translate
//! parameters, mirroring the order the guest wrote them in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::header::CommandHeader;

const DESCRIPTOR_TYPE_MASK: u32 = 0xF;
const HANDLE_DESCRIPTOR: u32 = 0x0;
const STATIC_BUFFER_DESCRIPTOR: u32 = 0x2;
const MAPPED_BUFFER_FLAG: u32 = 0x8;
const MOVE_HANDLE_FLAG: u32 = 0x10;
const CALLING_PROCESS_FLAG: u32 = 0x20;

/// Raw request as handed over by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcRequest {
    words: Vec<u32>,
    #[serde(default)]
    buffers: Vec<Vec<u8>>,
}

impl IpcRequest {
    /// Creates a request without static buffer payloads.
    #[must_use]
    pub const fn new(words: Vec<u32>) -> Self {
        Self {
            words,
            buffers: Vec::new(),
        }
    }

    /// Creates a request carrying static buffer payloads in descriptor order.
    #[must_use]
    pub const fn with_buffers(words: Vec<u32>, buffers: Vec<Vec<u8>>) -> Self {
        Self { words, buffers }
    }

    /// Raw command buffer words, header included.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Static buffer payloads.
    #[must_use]
    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    /// Decodes and validates the header word.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRequest`] when the buffer is empty or holds fewer
    /// parameter words than the header announces.
    pub fn header(&self) -> Result<CommandHeader, MalformedRequest> {
        let (first, rest) = self.words.split_first().ok_or(MalformedRequest::Empty)?;
        let header = CommandHeader::from_raw(*first);
        if rest.len() < header.payload_words() {
            return Err(MalformedRequest::Truncated {
                header,
                expected: header.payload_words(),
                actual: rest.len(),
            });
        }
        Ok(header)
    }

    /// Returns a parser positioned at the first normal parameter.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRequest`] under the same conditions as
    /// [`IpcRequest::header`].
    pub fn parser(&self) -> Result<RequestParser<'_>, MalformedRequest> {
        let header = self.header()?;
        let payload = self.words.get(1..).unwrap_or_default();
        let (normal, rest) = payload.split_at(header.normal_words());
        let translate = rest.get(..header.translate_words()).unwrap_or_default();
        Ok(RequestParser {
            header,
            normal,
            translate,
            buffers: &self.buffers,
            normal_pos: 0,
            translate_pos: 0,
            buffer_pos: 0,
        })
    }
}

/// A request buffer that cannot be decoded at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedRequest {
    /// The buffer has no header word.
    #[error("empty command buffer")]
    Empty,
    /// The buffer is shorter than its header announces.
    #[error("command {header} announces {expected} parameter words but carries {actual}")]
    Truncated {
        /// Header word as received.
        header: CommandHeader,
        /// Words announced by the header.
        expected: usize,
        /// Words actually present.
        actual: usize,
    },
}

impl MalformedRequest {
    /// Header of the request, when one could be read.
    #[must_use]
    pub const fn header(&self) -> Option<CommandHeader> {
        match self {
            Self::Empty => None,
            Self::Truncated { header, .. } => Some(*header),
        }
    }
}

/// Parameters that do not match what the handler expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// The normal parameter area is exhausted.
    #[error("expected {wanted} more normal words at offset {offset}")]
    NormalUnderrun {
        /// Offset of the first missing word.
        offset: usize,
        /// Words requested.
        wanted: usize,
    },
    /// The translate parameter area is exhausted.
    #[error("expected {wanted} more translate words at offset {offset}")]
    TranslateUnderrun {
        /// Offset of the first missing word.
        offset: usize,
        /// Words requested.
        wanted: usize,
    },
    /// The next translate descriptor is of another kind.
    #[error("expected a {expected} descriptor but found {found:#010X}")]
    UnexpectedDescriptor {
        /// Kind the handler asked for.
        expected: &'static str,
        /// Descriptor word found instead.
        found: u32,
    },
    /// A static buffer descriptor has no matching payload.
    #[error("static buffer {index} has no payload")]
    MissingBuffer {
        /// Position of the buffer among the request's static buffers.
        index: usize,
    },
}

/// How handles in a handle descriptor are transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleTransfer {
    /// The guest keeps its handles.
    Copy,
    /// The guest's handles are closed on transfer.
    Move,
    /// The kernel substitutes the caller's process id.
    CallingProcess,
}

/// Handles decoded from one handle descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleSet {
    /// Transfer mode.
    pub transfer: HandleTransfer,
    /// Handle words in order.
    pub handles: Vec<u32>,
}

/// Static buffer decoded from a descriptor and its resolved payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticBuffer<'a> {
    /// Static buffer slot id.
    pub id: u8,
    /// Guest address of the buffer.
    pub address: u32,
    /// Payload as resolved by the transport, truncated to the declared size.
    pub data: &'a [u8],
}

/// Mapped buffer permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedPermissions {
    /// The service reads from the buffer.
    Read,
    /// The service writes to the buffer.
    Write,
    /// The service reads and writes.
    ReadWrite,
}

/// Mapped buffer decoded from a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedBuffer {
    /// Access the guest granted.
    pub permissions: MappedPermissions,
    /// Size in bytes.
    pub size: u32,
    /// Guest address.
    pub address: u32,
}

/// Cursor over the parameters of one request.
#[derive(Debug)]
pub struct RequestParser<'a> {
    header: CommandHeader,
    normal: &'a [u32],
    translate: &'a [u32],
    buffers: &'a [Vec<u8>],
    normal_pos: usize,
    translate_pos: usize,
    buffer_pos: usize,
}

impl<'a> RequestParser<'a> {
    /// Header of the request being parsed.
    #[must_use]
    pub const fn header(&self) -> CommandHeader {
        self.header
    }

    /// Number of normal words not yet consumed.
    #[must_use]
    pub const fn remaining_normal(&self) -> usize {
        self.normal.len().saturating_sub(self.normal_pos)
    }

    /// Pops one normal word.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::NormalUnderrun`] when no word is left.
    pub fn pop_u32(&mut self) -> Result<u32, ParameterError> {
        let word = self
            .normal
            .get(self.normal_pos)
            .copied()
            .ok_or(ParameterError::NormalUnderrun {
                offset: self.normal_pos,
                wanted: 1,
            })?;
        self.normal_pos += 1;
        Ok(word)
    }

    /// Pops one normal word reinterpreted as signed.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::NormalUnderrun`] when no word is left.
    #[expect(
        clippy::cast_possible_wrap,
        reason = "the guest writes signed values as their two's complement bit pattern"
    )]
    pub fn pop_i32(&mut self) -> Result<i32, ParameterError> {
        self.pop_u32().map(|word| word as i32)
    }

    /// Pops a 64-bit value stored low word first.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::NormalUnderrun`] when fewer than two words
    /// are left.
    pub fn pop_u64(&mut self) -> Result<u64, ParameterError> {
        if self.remaining_normal() < 2 {
            return Err(ParameterError::NormalUnderrun {
                offset: self.normal_pos,
                wanted: 2,
            });
        }
        let low = u64::from(self.pop_u32()?);
        let high = u64::from(self.pop_u32()?);
        Ok((high << 32) | low)
    }

    /// Pops a boolean stored in the low byte of a word.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::NormalUnderrun`] when no word is left.
    pub fn pop_bool(&mut self) -> Result<bool, ParameterError> {
        self.pop_u32().map(|word| word & 0xFF != 0)
    }

    /// Skips normal words the handler does not use.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::NormalUnderrun`] when fewer than `count`
    /// words are left.
    pub fn skip(&mut self, count: usize) -> Result<(), ParameterError> {
        if self.remaining_normal() < count {
            return Err(ParameterError::NormalUnderrun {
                offset: self.normal_pos,
                wanted: count,
            });
        }
        self.normal_pos += count;
        Ok(())
    }

    /// Pops a handle descriptor and the handle words that follow it.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] when the next translate word is not a
    /// handle descriptor or the handle words are missing.
    pub fn pop_handles(&mut self) -> Result<HandleSet, ParameterError> {
        let descriptor = self.peek_translate()?;
        if descriptor & DESCRIPTOR_TYPE_MASK != HANDLE_DESCRIPTOR {
            return Err(ParameterError::UnexpectedDescriptor {
                expected: "handle",
                found: descriptor,
            });
        }
        let transfer = if descriptor & CALLING_PROCESS_FLAG != 0 {
            HandleTransfer::CallingProcess
        } else if descriptor & MOVE_HANDLE_FLAG != 0 {
            HandleTransfer::Move
        } else {
            HandleTransfer::Copy
        };
        let count = (descriptor >> 26) as usize + 1;
        let handles = self.translate_words(1, count)?.to_vec();
        self.translate_pos += 1 + count;
        Ok(HandleSet { transfer, handles })
    }

    /// Pops a single handle, the common case of a one-handle descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] under the same conditions as
    /// [`RequestParser::pop_handles`], or when the descriptor holds no handle.
    pub fn pop_handle(&mut self) -> Result<u32, ParameterError> {
        let offset = self.translate_pos;
        let set = self.pop_handles()?;
        set.handles
            .first()
            .copied()
            .ok_or(ParameterError::TranslateUnderrun { offset, wanted: 1 })
    }

    /// Pops a static buffer descriptor and binds its payload.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] when the next translate word is not a
    /// static buffer descriptor, the address word is missing, or the
    /// transport supplied no payload for it.
    pub fn pop_static_buffer(&mut self) -> Result<StaticBuffer<'a>, ParameterError> {
        let descriptor = self.peek_translate()?;
        if descriptor & DESCRIPTOR_TYPE_MASK != STATIC_BUFFER_DESCRIPTOR {
            return Err(ParameterError::UnexpectedDescriptor {
                expected: "static buffer",
                found: descriptor,
            });
        }
        let address = self
            .translate_words(1, 1)?
            .first()
            .copied()
            .unwrap_or_default();
        let index = self.buffer_pos;
        let payload = self
            .buffers
            .get(index)
            .ok_or(ParameterError::MissingBuffer { index })?;
        let size = (descriptor >> 14) as usize;
        let data = payload.get(..size).unwrap_or(payload.as_slice());
        self.translate_pos += 2;
        self.buffer_pos += 1;
        Ok(StaticBuffer {
            id: u8::try_from((descriptor >> 10) & 0xF).unwrap_or_default(),
            address,
            data,
        })
    }

    /// Pops a mapped buffer descriptor and its address.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] when the next translate word is not a
    /// mapped buffer descriptor or the address word is missing.
    pub fn pop_mapped_buffer(&mut self) -> Result<MappedBuffer, ParameterError> {
        let descriptor = self.peek_translate()?;
        if descriptor & MAPPED_BUFFER_FLAG == 0 {
            return Err(ParameterError::UnexpectedDescriptor {
                expected: "mapped buffer",
                found: descriptor,
            });
        }
        let permissions = match (descriptor >> 1) & 0x3 {
            1 => MappedPermissions::Read,
            2 => MappedPermissions::Write,
            _ => MappedPermissions::ReadWrite,
        };
        let address = self
            .translate_words(1, 1)?
            .first()
            .copied()
            .unwrap_or_default();
        self.translate_pos += 2;
        Ok(MappedBuffer {
            permissions,
            size: descriptor >> 4,
            address,
        })
    }

    fn peek_translate(&self) -> Result<u32, ParameterError> {
        self.translate
            .get(self.translate_pos)
            .copied()
            .ok_or(ParameterError::TranslateUnderrun {
                offset: self.translate_pos,
                wanted: 1,
            })
    }

    fn translate_words(&self, skip: usize, count: usize) -> Result<&'a [u32], ParameterError> {
        let start = self.translate_pos + skip;
        self.translate
            .get(start..start + count)
            .ok_or(ParameterError::TranslateUnderrun {
                offset: start,
                wanted: count,
            })
    }
}
