//! Command buffer wire format.

mod header;
mod request;
mod response;
mod result;

pub use self::header::CommandHeader;
pub use self::request::{
    HandleSet, HandleTransfer, IpcRequest, MalformedRequest, MappedBuffer, MappedPermissions,
    ParameterError, RequestParser, StaticBuffer,
};
pub use self::response::{IpcResponse, MAX_STATIC_BUFFER_SIZE, OutputBuffer, ResponseBuilder};
pub use self::result::{ErrorDescription, ErrorLevel, ErrorModule, ErrorSummary, ResultCode};
