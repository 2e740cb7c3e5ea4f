//! Outbound command buffers.

use serde::{Deserialize, Serialize};

use super::header::CommandHeader;
use super::result::ResultCode;

/// Largest payload a static buffer descriptor can announce. The size field
/// is eighteen bits wide.
pub const MAX_STATIC_BUFFER_SIZE: usize = 0x3_FFFF;

/// Static buffer contents a handler wants copied back into guest memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBuffer {
    /// Static buffer slot id announced in the descriptor.
    pub id: u8,
    /// Bytes to copy.
    pub data: Vec<u8>,
}

/// Response handed back to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcResponse {
    words: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    buffers: Vec<OutputBuffer>,
}

impl IpcResponse {
    /// One-word error response for `command` carrying `result`.
    #[must_use]
    pub fn error(command: u16, result: ResultCode) -> Self {
        Self {
            words: vec![CommandHeader::new(command, 1, 0).raw(), result.raw()],
            buffers: Vec::new(),
        }
    }

    /// Raw response words, header included.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Static buffer contents to copy back.
    #[must_use]
    pub fn buffers(&self) -> &[OutputBuffer] {
        &self.buffers
    }

    /// Response header.
    #[must_use]
    pub fn header(&self) -> Option<CommandHeader> {
        self.words.first().copied().map(CommandHeader::from_raw)
    }

    /// Result code in the first normal word.
    #[must_use]
    pub fn result(&self) -> Option<ResultCode> {
        self.words.get(1).copied().map(ResultCode::from_raw)
    }

    /// Every word after the result code: the remaining normal words followed
    /// by the translate words.
    #[must_use]
    pub fn values(&self) -> &[u32] {
        self.words.get(2..).unwrap_or_default()
    }

    /// Splits the response into its words and buffers.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u32>, Vec<OutputBuffer>) {
        (self.words, self.buffers)
    }
}

/// Incrementally writes a response.
///
/// The result code is the first normal word. Normal and translate words are
/// collected separately and [`ResponseBuilder::build`] derives the header
/// from the final counts, so the header can never disagree with the payload.
///
/// ```
/// use hle_ipc::{ResponseBuilder, ResultCode};
///
/// let mut rb = ResponseBuilder::new(0x0050);
/// rb.push_result(ResultCode::SUCCESS);
/// rb.push_u32(80);
/// let response = rb.build();
/// assert_eq!(response.words(), &[0x0050_0080, 0, 80]);
/// ```
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    command: u16,
    normal: Vec<u32>,
    translate: Vec<u32>,
    buffers: Vec<OutputBuffer>,
}

impl ResponseBuilder {
    /// Starts a response for `command`.
    #[must_use]
    pub const fn new(command: u16) -> Self {
        Self {
            command,
            normal: Vec::new(),
            translate: Vec::new(),
            buffers: Vec::new(),
        }
    }

    /// Starts a response with `result` already pushed.
    #[must_use]
    pub fn with_result(command: u16, result: ResultCode) -> Self {
        let mut builder = Self::new(command);
        builder.push_result(result);
        builder
    }

    /// Pushes the result code.
    pub fn push_result(&mut self, result: ResultCode) -> &mut Self {
        self.push_u32(result.raw())
    }

    /// Pushes a normal word.
    pub fn push_u32(&mut self, value: u32) -> &mut Self {
        self.normal.push(value);
        self
    }

    /// Pushes a 64-bit value low word first.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the value is split into its two 32-bit halves"
    )]
    pub fn push_u64(&mut self, value: u64) -> &mut Self {
        self.push_u32(value as u32);
        self.push_u32((value >> 32) as u32)
    }

    /// Pushes a boolean as a word.
    pub fn push_bool(&mut self, value: bool) -> &mut Self {
        self.push_u32(u32::from(value))
    }

    /// Pushes handles the guest receives as copies.
    pub fn push_copy_handles(&mut self, handles: &[u32]) -> &mut Self {
        self.push_handles(0x0, handles)
    }

    /// Pushes handles whose ownership moves to the guest.
    pub fn push_move_handles(&mut self, handles: &[u32]) -> &mut Self {
        self.push_handles(0x10, handles)
    }

    /// Pushes a static buffer descriptor and the bytes to copy into slot `id`.
    ///
    /// Payloads longer than [`MAX_STATIC_BUFFER_SIZE`] are clipped to it, so
    /// the descriptor always announces the bytes that are sent.
    pub fn push_static_buffer(&mut self, id: u8, mut data: Vec<u8>) -> &mut Self {
        data.truncate(MAX_STATIC_BUFFER_SIZE);
        let size = u32::try_from(data.len()).unwrap_or(0);
        let descriptor = (size << 14) | ((u32::from(id) & 0xF) << 10) | 0x2;
        self.translate.push(descriptor);
        self.translate.push(0);
        self.buffers.push(OutputBuffer { id, data });
        self
    }

    /// Assembles the response.
    #[must_use]
    pub fn build(self) -> IpcResponse {
        let normal = u8::try_from(self.normal.len()).unwrap_or(u8::MAX);
        let translate = u8::try_from(self.translate.len()).unwrap_or(u8::MAX);
        let header = CommandHeader::new(self.command, normal, translate);
        let mut words = Vec::with_capacity(1 + self.normal.len() + self.translate.len());
        words.push(header.raw());
        words.extend(self.normal);
        words.extend(self.translate);
        IpcResponse {
            words,
            buffers: self.buffers,
        }
    }

    fn push_handles(&mut self, flags: u32, handles: &[u32]) -> &mut Self {
        if handles.is_empty() {
            return self;
        }
        let count = u32::try_from(handles.len() - 1).unwrap_or(0x3F) & 0x3F;
        self.translate.push((count << 26) | flags);
        self.translate.extend_from_slice(handles);
        self
    }
}
