//! Line codec for the control protocol
//!
//! Wraps [`LinesCodec`] so that malformed input never terminates the stream:
//! every complete line comes out of the decoder either as a parsed
//! [`ControlMessage`] or as an [`InboundLine::Malformed`] carrying the reason.
//! Over-long lines and invalid UTF-8 are reported the same way; `LinesCodec`
//! has already consumed them, so decoding resumes at the next line.
//!
//! The encoder writes `Angle: <a>, Speed: <s>\n`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use super::message::{parse_line, ControlMessage, ProtocolError};

/// Default maximum accepted line length in bytes
pub const MAX_LINE_LENGTH: usize = 256;

/// One decoded line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine {
    /// Well-formed control message (policy not yet applied)
    Control(ControlMessage),

    /// Line that could not be parsed
    Malformed {
        /// Raw line text (empty when it could not be decoded)
        line: String,
        /// Why it was rejected
        reason: ProtocolError,
    },
}

/// Codec for `Angle: <a>, Speed: <s>` lines
#[derive(Debug, Clone)]
pub struct ControlCodec {
    lines: LinesCodec,
    max_length: usize,
}

impl ControlCodec {
    /// Codec with the default maximum line length
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    /// Codec with a custom maximum line length
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
            max_length,
        }
    }

    fn classify(line: String) -> InboundLine {
        match parse_line(&line) {
            Ok(msg) => InboundLine::Control(msg),
            Err(reason) => InboundLine::Malformed { line, reason },
        }
    }

    fn map_error(&self, err: LinesCodecError) -> Result<Option<InboundLine>, std::io::Error> {
        match err {
            LinesCodecError::MaxLineLengthExceeded => Ok(Some(InboundLine::Malformed {
                line: String::new(),
                reason: ProtocolError::LineTooLong(self.max_length),
            })),
            LinesCodecError::Io(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                Ok(Some(InboundLine::Malformed {
                    line: String::new(),
                    reason: ProtocolError::InvalidEncoding,
                }))
            }
            LinesCodecError::Io(e) => Err(e),
        }
    }
}

impl Default for ControlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ControlCodec {
    type Item = InboundLine;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<InboundLine>, std::io::Error> {
        match self.lines.decode(buf) {
            Ok(Some(line)) => Ok(Some(Self::classify(line))),
            Ok(None) => Ok(None),
            Err(e) => self.map_error(e),
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<InboundLine>, std::io::Error> {
        match self.lines.decode_eof(buf) {
            Ok(Some(line)) => Ok(Some(Self::classify(line))),
            Ok(None) => Ok(None),
            Err(e) => self.map_error(e),
        }
    }
}

impl Encoder<ControlMessage> for ControlCodec {
    type Error = std::io::Error;

    fn encode(&mut self, msg: ControlMessage, dst: &mut BytesMut) -> Result<(), std::io::Error> {
        self.lines
            .encode(msg.to_line(), dst)
            .map_err(|e| match e {
                LinesCodecError::Io(io) => io,
                LinesCodecError::MaxLineLengthExceeded => {
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "line too long")
                }
            })
    }
}
