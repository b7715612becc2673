#![doc = include_str!("../README.md")]
#![doc(html_root_url = "https://docs.rs/yamlet/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::fn_params_excessive_bools,
    clippy::manual_range_contains,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::unnecessary_wraps,
    clippy::match_wildcard_for_single_variants
)]
#![deny(unsafe_code)]

mod macros;

mod composer;
mod constructor;
mod document;
mod dumper;
mod emitter;
mod error;
mod event;
mod parser;
mod reader;
mod resolver;
mod scanner;
mod token;
mod writer;

pub use crate::composer::Composer;
pub use crate::constructor::{Constructor, NodeKind, Value};
pub use crate::document::*;
pub use crate::emitter::Emitter;
pub use crate::error::*;
pub use crate::event::*;
pub use crate::parser::{Parser, ParserState};
pub use crate::resolver::Resolver;
pub use crate::scanner::Scanner;
pub use crate::token::*;

pub(crate) const INPUT_RAW_BUFFER_SIZE: usize = 16384;
pub(crate) const OUTPUT_BUFFER_SIZE: usize = 16384;

/// The tag `!!null` with the only possible value: `null`.
pub const NULL_TAG: &str = "tag:yaml.org,2002:null";
/// The tag `!!bool` with the values: `true` and `false`.
pub const BOOL_TAG: &str = "tag:yaml.org,2002:bool";
/// The tag `!!str` for string values.
pub const STR_TAG: &str = "tag:yaml.org,2002:str";
/// The tag `!!int` for integer values.
pub const INT_TAG: &str = "tag:yaml.org,2002:int";
/// The tag `!!float` for float values.
pub const FLOAT_TAG: &str = "tag:yaml.org,2002:float";
/// The tag `!!timestamp` for date and time values.
pub const TIMESTAMP_TAG: &str = "tag:yaml.org,2002:timestamp";
/// The tag `!!binary` for base64-encoded binary values.
pub const BINARY_TAG: &str = "tag:yaml.org,2002:binary";
/// The tag `!!merge` for the `<<` merge key.
pub const MERGE_TAG: &str = "tag:yaml.org,2002:merge";
/// The tag `!!value` for the `=` default key.
pub const VALUE_TAG: &str = "tag:yaml.org,2002:value";

/// The tag `!!seq` is used to denote sequences.
pub const SEQ_TAG: &str = "tag:yaml.org,2002:seq";
/// The tag `!!map` is used to denote mapping.
pub const MAP_TAG: &str = "tag:yaml.org,2002:map";
/// The tag `!!omap` for ordered mappings.
pub const OMAP_TAG: &str = "tag:yaml.org,2002:omap";
/// The tag `!!pairs` for mappings with repeatable keys.
pub const PAIRS_TAG: &str = "tag:yaml.org,2002:pairs";
/// The tag `!!set` for unordered sets.
pub const SET_TAG: &str = "tag:yaml.org,2002:set";

/// The default scalar tag is `!!str`.
pub const DEFAULT_SCALAR_TAG: &str = STR_TAG;
/// The default sequence tag is `!!seq`.
pub const DEFAULT_SEQUENCE_TAG: &str = SEQ_TAG;
/// The default mapping tag is `!!map`.
pub const DEFAULT_MAPPING_TAG: &str = MAP_TAG;

/// The version directive data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct VersionDirective {
    /// The major version number.
    pub major: i32,
    /// The minor version number.
    pub minor: i32,
}

impl VersionDirective {
    pub fn new(major: i32, minor: i32) -> VersionDirective {
        VersionDirective { major, minor }
    }
}

/// The tag directive data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TagDirective {
    /// The tag handle.
    pub handle: String,
    /// The tag prefix.
    pub prefix: String,
}

impl TagDirective {
    pub fn new(handle: &str, prefix: &str) -> TagDirective {
        TagDirective {
            handle: String::from(handle),
            prefix: String::from(prefix),
        }
    }
}

/// The stream encoding.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum Encoding {
    /// Let the parser choose the encoding.
    #[default]
    Any = 0,
    /// The default UTF-8 encoding.
    Utf8 = 1,
    /// The UTF-16-LE encoding with BOM.
    Utf16Le = 2,
    /// The UTF-16-BE encoding with BOM.
    Utf16Be = 3,
    /// The UTF-32-LE encoding with BOM.
    Utf32Le = 4,
    /// The UTF-32-BE encoding with BOM.
    Utf32Be = 5,
}

/// Line break type.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum Break {
    /// Let the parser choose the break type.
    #[default]
    Any = 0,
    /// Use CR for line breaks (Mac style).
    Cr = 1,
    /// Use LN for line breaks (Unix style).
    Ln = 2,
    /// Use CR LN for line breaks (DOS style).
    CrLn = 3,
}

/// Scalar styles.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum ScalarStyle {
    /// Let the emitter choose the style.
    #[default]
    Any = 0,
    /// The plain scalar style.
    Plain = 1,
    /// The single-quoted scalar style.
    SingleQuoted = 2,
    /// The double-quoted scalar style.
    DoubleQuoted = 3,
    /// The literal scalar style.
    Literal = 4,
    /// The folded scalar style.
    Folded = 5,
}

/// Sequence styles.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum SequenceStyle {
    /// Let the emitter choose the style.
    #[default]
    Any = 0,
    /// The block sequence style.
    Block = 1,
    /// The flow sequence style.
    Flow = 2,
}

/// Mapping styles.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum MappingStyle {
    /// Let the emitter choose the style.
    #[default]
    Any = 0,
    /// The block mapping style.
    Block = 1,
    /// The flow mapping style.
    Flow = 2,
}

/// A default style for sequences and mappings that carry no explicit style.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum CollectionStyle {
    /// Let the emitter choose the style.
    #[default]
    Any = 0,
    /// The block collection style.
    Block = 1,
    /// The flow collection style.
    Flow = 2,
}

/// Options controlling [`dump`].
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Force explicit tags and double-quoted scalars.
    pub canonical: bool,
    /// The number of indentation spaces, in `1..=9`.
    pub indent: i32,
    /// The preferred line width; must be at least twice the indent.
    pub width: i32,
    /// The output line break.
    pub line_break: Break,
    /// The output encoding. UTF-16 and UTF-32 outputs begin with a BOM.
    pub encoding: Encoding,
    /// Allow unescaped non-ASCII characters.
    pub unicode: bool,
    /// The `%YAML` directive to emit, or `None` for none.
    pub yaml_version: Option<VersionDirective>,
    /// `%TAG` directives to emit before each document.
    pub tag_directives: Vec<TagDirective>,
    /// Always write the `---` document start indicator.
    pub explicit_start: bool,
    /// Always write the `...` document end indicator.
    pub explicit_end: bool,
    /// Style for scalar nodes that carry no style of their own.
    pub default_scalar_style: ScalarStyle,
    /// Style for collection nodes that carry no style of their own.
    pub default_collection_style: CollectionStyle,
}

impl Default for DumpOptions {
    fn default() -> Self {
        DumpOptions {
            canonical: false,
            indent: 2,
            width: 80,
            line_break: Break::Ln,
            encoding: Encoding::Utf8,
            unicode: false,
            yaml_version: Some(VersionDirective { major: 1, minor: 1 }),
            tag_directives: Vec::new(),
            explicit_start: false,
            explicit_end: false,
            default_scalar_style: ScalarStyle::Any,
            default_collection_style: CollectionStyle::Any,
        }
    }
}

/// Load every document from `input`.
///
/// Empty input yields an empty vector.
pub fn load_all(input: &mut dyn std::io::BufRead) -> Result<Vec<Document>> {
    let mut parser = Parser::new();
    parser.set_input(input);
    let mut composer = Composer::new(&mut parser);
    let mut documents = Vec::new();
    while let Some(document) = composer.get_node()? {
        documents.push(document);
    }
    Ok(documents)
}

/// Load exactly one document from `input`.
///
/// Fails when the input holds zero documents or more than one.
pub fn load_one(input: &mut dyn std::io::BufRead) -> Result<Document> {
    let mut parser = Parser::new();
    parser.set_input(input);
    let mut composer = Composer::new(&mut parser);
    Ok(composer.get_single_node()?)
}

/// Dump `documents` to `output` as a YAML stream.
pub fn dump(
    output: &mut dyn std::io::Write,
    documents: Vec<Document>,
    options: &DumpOptions,
) -> Result<()> {
    let mut emitter = Emitter::new();
    emitter.set_output(output);
    emitter.set_encoding(options.encoding);
    emitter.set_canonical(options.canonical);
    emitter.set_indent(options.indent);
    emitter.set_width(options.width);
    emitter.set_unicode(options.unicode);
    emitter.set_break(options.line_break);
    emitter.open()?;
    let mut tag_directives = options.tag_directives.clone();
    tag_directives.sort_by(|a, b| a.handle.cmp(&b.handle));
    for mut document in documents {
        document.version_directive = options.yaml_version;
        document.tag_directives = tag_directives.clone();
        document.start_implicit = !options.explicit_start;
        document.end_implicit = !options.explicit_end;
        document.apply_default_styles(
            options.default_scalar_style,
            options.default_collection_style,
        );
        document.dump(&mut emitter)?;
    }
    emitter.close()?;
    emitter.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests;
