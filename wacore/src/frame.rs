//! Line framing used by the snapshot bridge.
//!
//! Every frame is a single line, `<Tag>\\<json payload>\n`. The separator is
//! two literal backslashes, which can never open a JSON document, so matching
//! `Tag + SEPARATOR` anchored at the start of the line is unambiguous no matter
//! what the payload contains.

use crate::types::contact::ContactRecord;
use crate::types::group::GroupRecord;
use std::fmt;
use thiserror::Error;

pub const SEPARATOR: &str = "\\\\";
pub const FRAME_MAX_SIZE: usize = 2 << 23;

/// Terminator spelling written by the first producer builds.
const LEGACY_END_TAG: &str = "END";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    SetContact,
    SetGroup,
    End,
}

impl Tag {
    pub const ALL: [Tag; 3] = [Tag::SetContact, Tag::SetGroup, Tag::End];

    pub const fn as_str(self) -> &'static str {
        match self {
            Tag::SetContact => "SetContact",
            Tag::SetGroup => "SetGroup",
            Tag::End => "End",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Unknown frame tag in line {0:?}")]
    UnknownTag(String),
    #[error("Malformed {tag} payload: {source}")]
    MalformedPayload {
        tag: Tag,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unexpected payload on {0} frame")]
    UnexpectedPayload(Tag),
    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,
    #[error("Frame is too large (max: {max}, got: {got})")]
    FrameTooLarge { max: usize, got: usize },
    #[error("Failed to encode {tag} payload: {source}")]
    Encode {
        tag: Tag,
        #[source]
        source: serde_json::Error,
    },
}

impl FrameError {
    /// Whether a reader can drop the offending line and keep going.
    ///
    /// Unknown tags are not recoverable: the protocol has no notion of an
    /// optional frame, so a tag we do not know means the peers disagree on
    /// the protocol itself.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::MalformedPayload { .. }
                | FrameError::UnexpectedPayload(_)
                | FrameError::InvalidUtf8
                | FrameError::FrameTooLarge { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    SetContact(ContactRecord),
    SetGroup(GroupRecord),
    End,
}

impl Frame {
    pub fn tag(&self) -> Tag {
        match self {
            Frame::SetContact(_) => Tag::SetContact,
            Frame::SetGroup(_) => Tag::SetGroup,
            Frame::End => Tag::End,
        }
    }

    /// Encodes the frame into `out`, newline included. `out` is cleared first
    /// so the buffer can be reused across frames.
    pub fn encode_into(&self, out: &mut String) -> Result<(), FrameError> {
        let tag = self.tag();
        let payload = match self {
            Frame::SetContact(contact) => serde_json::to_string(contact),
            Frame::SetGroup(group) => serde_json::to_string(group),
            Frame::End => Ok(String::new()),
        }
        .map_err(|source| FrameError::Encode { tag, source })?;

        // Compact JSON escapes control characters inside strings.
        debug_assert!(!payload.contains('\n'));

        out.clear();
        out.reserve(tag.as_str().len() + SEPARATOR.len() + payload.len() + 1);
        out.push_str(tag.as_str());
        out.push_str(SEPARATOR);
        out.push_str(&payload);
        out.push('\n');
        Ok(())
    }

    pub fn encode(&self) -> Result<String, FrameError> {
        let mut out = String::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Decodes one line. A trailing `\n` or `\r\n` is ignored.
    pub fn decode(line: &str) -> Result<Frame, FrameError> {
        if line.len() > FRAME_MAX_SIZE {
            return Err(FrameError::FrameTooLarge {
                max: FRAME_MAX_SIZE,
                got: line.len(),
            });
        }

        let line = line.trim_end_matches(['\n', '\r']);
        let (tag, payload) =
            split_tag(line).ok_or_else(|| FrameError::UnknownTag(line.to_string()))?;

        match tag {
            Tag::SetContact => serde_json::from_str(payload)
                .map(Frame::SetContact)
                .map_err(|source| FrameError::MalformedPayload { tag, source }),
            Tag::SetGroup => serde_json::from_str(payload)
                .map(Frame::SetGroup)
                .map_err(|source| FrameError::MalformedPayload { tag, source }),
            Tag::End if payload.trim().is_empty() => Ok(Frame::End),
            Tag::End => Err(FrameError::UnexpectedPayload(Tag::End)),
        }
    }

    /// Decodes raw bytes read off the wire.
    pub fn decode_bytes(line: &[u8]) -> Result<Frame, FrameError> {
        let line = std::str::from_utf8(line).map_err(|_| FrameError::InvalidUtf8)?;
        Self::decode(line)
    }
}

/// Every accepted tag spelling, longest first.
const TAG_PREFIXES: [(&str, Tag); 4] = [
    ("SetContact", Tag::SetContact),
    ("SetGroup", Tag::SetGroup),
    ("End", Tag::End),
    (LEGACY_END_TAG, Tag::End),
];

/// Finds the tag at the start of `line` and returns it with the rest of the
/// line.
fn split_tag(line: &str) -> Option<(Tag, &str)> {
    TAG_PREFIXES.iter().find_map(|(prefix, tag)| {
        line.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .map(|payload| (*tag, payload))
    })
}
