use crate::{Encoding, Mark, ScalarStyle};

/// The token structure.
#[derive(Debug, PartialEq)]
#[non_exhaustive]
pub struct Token {
    /// The token type.
    pub data: TokenData,
    /// The beginning of the token.
    pub start_mark: Mark,
    /// The end of the token.
    pub end_mark: Mark,
}

#[derive(Debug, PartialEq)]
pub enum TokenData {
    /// A STREAM-START token.
    StreamStart {
        /// The stream encoding.
        encoding: Encoding,
    },
    /// A STREAM-END token.
    StreamEnd,
    /// A VERSION-DIRECTIVE token.
    VersionDirective {
        /// The major version number.
        major: i32,
        /// The minor version number.
        minor: i32,
    },
    /// A TAG-DIRECTIVE token.
    TagDirective {
        /// The tag handle.
        handle: String,
        /// The tag prefix.
        prefix: String,
    },
    /// A DOCUMENT-START token.
    DocumentStart,
    /// A DOCUMENT-END token.
    DocumentEnd,
    /// A BLOCK-SEQUENCE-START token.
    BlockSequenceStart,
    /// A BLOCK-MAPPING-START token.
    BlockMappingStart,
    /// A BLOCK-END token.
    BlockEnd,
    /// A FLOW-SEQUENCE-START token.
    FlowSequenceStart,
    /// A FLOW-SEQUENCE-END token.
    FlowSequenceEnd,
    /// A FLOW-MAPPING-START token.
    FlowMappingStart,
    /// A FLOW-MAPPING-END token.
    FlowMappingEnd,
    /// A BLOCK-ENTRY token.
    BlockEntry,
    /// A FLOW-ENTRY token.
    FlowEntry,
    /// A KEY token.
    Key,
    /// A VALUE token.
    Value,
    /// An ALIAS token.
    Alias {
        /// The alias value.
        value: String,
    },
    /// An ANCHOR token.
    Anchor {
        /// The anchor value.
        value: String,
    },
    /// A TAG token.
    ///
    /// Handle and suffix share one allocation: `value[..divider]` is the
    /// handle, `value[divider..]` the suffix.
    Tag {
        /// The handle followed by the suffix.
        value: String,
        /// The byte index where the suffix begins.
        divider: usize,
    },
    /// A SCALAR token.
    Scalar {
        /// The scalar value.
        value: String,
        /// The scalar style.
        style: ScalarStyle,
    },
}

impl TokenData {
    /// Make a TAG token value from a separate handle and suffix.
    pub fn tag(handle: &str, suffix: &str) -> TokenData {
        let mut value = String::with_capacity(handle.len() + suffix.len());
        value.push_str(handle);
        value.push_str(suffix);
        TokenData::Tag {
            value,
            divider: handle.len(),
        }
    }
}

impl Token {
    /// The handle part of a TAG token, or `None` for other kinds.
    pub fn tag_handle(&self) -> Option<&str> {
        match &self.data {
            TokenData::Tag { value, divider } => Some(&value[..*divider]),
            _ => None,
        }
    }

    /// The suffix part of a TAG token, or `None` for other kinds.
    pub fn tag_suffix(&self) -> Option<&str> {
        match &self.data {
            TokenData::Tag { value, divider } => Some(&value[*divider..]),
            _ => None,
        }
    }
}
