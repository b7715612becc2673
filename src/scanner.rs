use std::collections::VecDeque;

use crate::macros::{
    as_digit, as_hex, is_alpha, is_blank, is_blankz, is_bom, is_break, is_breakz, is_digit,
    is_hex, is_space, is_tab,
};
use crate::reader::Reader;
use crate::{Encoding, Mark, ScalarStyle, ScannerError, Token, TokenData};

/// This structure holds information about a potential simple key.
#[derive(Copy, Clone)]
struct SimpleKey {
    /// Is a simple key possible?
    possible: bool,
    /// Is a simple key required?
    required: bool,
    /// The number of the token.
    token_number: usize,
    /// The position mark.
    mark: Mark,
}

impl SimpleKey {
    fn none() -> SimpleKey {
        SimpleKey {
            possible: false,
            required: false,
            token_number: 0,
            mark: Mark::default(),
        }
    }
}

/// Transforms the character stream into the token stream.
///
/// Tokens are produced lazily into an internal queue: recognizing a `:`
/// may require a KEY token to be inserted *behind* tokens that are already
/// queued, so the queue cannot be handed out eagerly.
#[non_exhaustive]
pub struct Scanner<'r> {
    pub(crate) reader: Reader<'r>,
    /// Have we started to scan the input stream?
    stream_start_produced: bool,
    /// Have we reached the end of the input stream?
    pub(crate) stream_end_produced: bool,
    /// The number of unclosed '[' and '{' indicators.
    flow_level: i32,
    /// The tokens queue.
    pub(crate) tokens: VecDeque<Token>,
    /// The number of tokens fetched from the queue.
    pub(crate) tokens_parsed: usize,
    /// Does the tokens queue contain a token ready for dequeueing.
    pub(crate) token_available: bool,
    /// The indentation levels stack.
    indents: Vec<i32>,
    /// The current indentation level.
    indent: i32,
    /// May a simple key occur at the current position?
    simple_key_allowed: bool,
    /// The stack of simple keys, one slot per flow level.
    simple_keys: Vec<SimpleKey>,
}

impl<'r> Default for Scanner<'r> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Scanner<'r> {
    /// Create a scanner.
    pub fn new() -> Scanner<'r> {
        Scanner {
            reader: Reader::new(),
            stream_start_produced: false,
            stream_end_produced: false,
            flow_level: 0,
            tokens: VecDeque::with_capacity(16),
            tokens_parsed: 0,
            token_available: false,
            indents: Vec::with_capacity(16),
            indent: -1,
            simple_key_allowed: false,
            simple_keys: Vec::with_capacity(16),
        }
    }

    /// Set a string input.
    pub fn set_input_string(&mut self, input: &'r mut &[u8]) {
        self.reader.set_input(input);
    }

    /// Set a generic input handler.
    pub fn set_input(&mut self, input: &'r mut dyn std::io::BufRead) {
        self.reader.set_input(input);
    }

    /// Set the source encoding, overriding BOM detection.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.reader.set_encoding(encoding);
    }

    /// Scan the input stream and produce the next token.
    ///
    /// Call the function subsequently to produce a sequence of tokens
    /// corresponding to the input stream. The initial token has the type
    /// [`TokenData::StreamStart`] while the ending token has the type
    /// [`TokenData::StreamEnd`].
    ///
    /// An application must not alternate the calls of [`Scanner::scan()`]
    /// with the calls of [`Parser::parse()`](crate::Parser::parse) on the
    /// same stream. Doing this will break the scanner.
    pub fn scan(&mut self) -> Result<Token, ScannerError> {
        if self.stream_end_produced {
            return Ok(Token {
                data: TokenData::StreamEnd,
                start_mark: self.reader.mark(),
                end_mark: self.reader.mark(),
            });
        }
        if !self.token_available {
            self.fetch_more_tokens()?;
        }
        if let Some(token) = self.tokens.pop_front() {
            self.token_available = false;
            self.tokens_parsed += 1;
            if let TokenData::StreamEnd = &token.data {
                self.stream_end_produced = true;
            }
            Ok(token)
        } else {
            unreachable!("no more tokens, but stream-end was not produced")
        }
    }

    fn set_scanner_error<T>(
        &self,
        context: &'static str,
        context_mark: Mark,
        problem: &'static str,
    ) -> Result<T, ScannerError> {
        Err(ScannerError::Problem {
            context,
            context_mark,
            problem,
            problem_mark: self.reader.mark(),
        })
    }

    /// Fetch tokens until one at the head of the queue can be returned.
    ///
    /// The head token cannot be released while any pending simple key still
    /// points at it, because a later ':' may turn that position into a KEY.
    pub(crate) fn fetch_more_tokens(&mut self) -> Result<(), ScannerError> {
        loop {
            let mut need_more_tokens = false;
            if self.tokens.is_empty() {
                need_more_tokens = true;
            } else {
                self.stale_simple_keys()?;
                for simple_key in &self.simple_keys {
                    if simple_key.possible && simple_key.token_number == self.tokens_parsed {
                        need_more_tokens = true;
                        break;
                    }
                }
            }
            if !need_more_tokens {
                break;
            }
            self.fetch_next_token()?;
        }
        self.token_available = true;
        Ok(())
    }

    fn fetch_next_token(&mut self) -> Result<(), ScannerError> {
        self.reader.cache(1)?;
        if !self.stream_start_produced {
            self.fetch_stream_start();
            return Ok(());
        }
        self.scan_to_next_token()?;
        self.stale_simple_keys()?;
        self.unroll_indent(self.reader.mark().column as i64);
        self.reader.cache(4)?;
        if self.reader.peek().is_none() {
            return self.fetch_stream_end();
        }
        if self.reader.mark().column == 0 && self.reader.check('%') {
            return self.fetch_directive();
        }
        if self.reader.mark().column == 0
            && self.reader.check_at('-', 0)
            && self.reader.check_at('-', 1)
            && self.reader.check_at('-', 2)
            && is_blankz(self.reader.peek_at(3))
        {
            return self.fetch_document_indicator(TokenData::DocumentStart);
        }
        if self.reader.mark().column == 0
            && self.reader.check_at('.', 0)
            && self.reader.check_at('.', 1)
            && self.reader.check_at('.', 2)
            && is_blankz(self.reader.peek_at(3))
        {
            return self.fetch_document_indicator(TokenData::DocumentEnd);
        }
        if self.reader.check('[') {
            return self.fetch_flow_collection_start(TokenData::FlowSequenceStart);
        }
        if self.reader.check('{') {
            return self.fetch_flow_collection_start(TokenData::FlowMappingStart);
        }
        if self.reader.check(']') {
            return self.fetch_flow_collection_end(TokenData::FlowSequenceEnd);
        }
        if self.reader.check('}') {
            return self.fetch_flow_collection_end(TokenData::FlowMappingEnd);
        }
        if self.reader.check(',') {
            return self.fetch_flow_entry();
        }
        if self.reader.check('-') && is_blankz(self.reader.peek_at(1)) {
            return self.fetch_block_entry();
        }
        if self.reader.check('?')
            && (self.flow_level != 0 || is_blankz(self.reader.peek_at(1)))
        {
            return self.fetch_key();
        }
        if self.reader.check(':')
            && (self.flow_level != 0 || is_blankz(self.reader.peek_at(1)))
        {
            return self.fetch_value();
        }
        if self.reader.check('*') {
            return self.fetch_anchor(true);
        }
        if self.reader.check('&') {
            return self.fetch_anchor(false);
        }
        if self.reader.check('!') {
            return self.fetch_tag();
        }
        if self.reader.check('|') && self.flow_level == 0 {
            return self.fetch_block_scalar(true);
        }
        if self.reader.check('>') && self.flow_level == 0 {
            return self.fetch_block_scalar(false);
        }
        if self.reader.check('\'') {
            return self.fetch_flow_scalar(true);
        }
        if self.reader.check('"') {
            return self.fetch_flow_scalar(false);
        }
        let indicator = matches!(
            self.reader.peek(),
            Some(
                '-' | '?' | ':' | ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|'
                    | '>' | '\'' | '"' | '%' | '@' | '`'
            )
        );
        if !(is_blankz(self.reader.peek()) || indicator)
            || self.reader.check('-') && !is_blank(self.reader.peek_at(1))
            || self.flow_level == 0
                && (self.reader.check('?') || self.reader.check(':'))
                && !is_blankz(self.reader.peek_at(1))
        {
            return self.fetch_plain_scalar();
        }
        self.set_scanner_error(
            "while scanning for the next token",
            self.reader.mark(),
            "found character that cannot start any token",
        )
    }

    /// Invalidate simple keys that crossed a line or ran past 1024
    /// characters without seeing their ':'.
    fn stale_simple_keys(&mut self) -> Result<(), ScannerError> {
        let current_mark = self.reader.mark();
        for simple_key in &mut self.simple_keys {
            let mark = simple_key.mark;
            if simple_key.possible
                && (mark.line < current_mark.line || mark.index + 1024 < current_mark.index)
            {
                if simple_key.required {
                    return Err(ScannerError::Problem {
                        context: "while scanning a simple key",
                        context_mark: mark,
                        problem: "could not find expected ':'",
                        problem_mark: current_mark,
                    });
                }
                simple_key.possible = false;
            }
        }
        Ok(())
    }

    fn save_simple_key(&mut self) -> Result<(), ScannerError> {
        let mark = self.reader.mark();
        let required = self.flow_level == 0 && self.indent as i64 == mark.column as i64;
        if self.simple_key_allowed {
            let simple_key = SimpleKey {
                possible: true,
                required,
                token_number: self.tokens_parsed + self.tokens.len(),
                mark,
            };
            self.remove_simple_key()?;
            *self.simple_keys.last_mut().unwrap() = simple_key;
        }
        Ok(())
    }

    fn remove_simple_key(&mut self) -> Result<(), ScannerError> {
        let current_mark = self.reader.mark();
        let simple_key = self.simple_keys.last_mut().unwrap();
        if simple_key.possible && simple_key.required {
            return Err(ScannerError::Problem {
                context: "while scanning a simple key",
                context_mark: simple_key.mark,
                problem: "could not find expected ':'",
                problem_mark: current_mark,
            });
        }
        simple_key.possible = false;
        Ok(())
    }

    fn increase_flow_level(&mut self) {
        self.simple_keys.push(SimpleKey::none());
        assert!(self.flow_level != i32::MAX, "flow_level integer overflow");
        self.flow_level += 1;
    }

    fn decrease_flow_level(&mut self) {
        if self.flow_level != 0 {
            self.flow_level -= 1;
            let _ = self.simple_keys.pop();
        }
    }

    /// Push the current indent and open a block collection at `column`.
    ///
    /// `number` is the absolute token number to insert the start token at,
    /// or `None` to append it.
    fn roll_indent(&mut self, column: i64, number: Option<usize>, data: TokenData, mark: Mark) {
        if self.flow_level != 0 {
            return;
        }
        if (self.indent as i64) < column {
            self.indents.push(self.indent);
            assert!(column <= i64::from(i32::MAX), "integer overflow");
            self.indent = column as i32;
            let token = Token {
                data,
                start_mark: mark,
                end_mark: mark,
            };
            if let Some(number) = number {
                self.tokens.insert(number - self.tokens_parsed, token);
            } else {
                self.tokens.push_back(token);
            }
        }
    }

    /// Pop indents above `column`, emitting a BLOCK-END per pop.
    fn unroll_indent(&mut self, column: i64) {
        if self.flow_level != 0 {
            return;
        }
        while self.indent as i64 > column {
            let mark = self.reader.mark();
            self.tokens.push_back(Token {
                data: TokenData::BlockEnd,
                start_mark: mark,
                end_mark: mark,
            });
            self.indent = self.indents.pop().unwrap();
        }
    }

    fn fetch_stream_start(&mut self) {
        let mark = self.reader.mark();
        self.indent = -1;
        self.simple_keys.push(SimpleKey::none());
        self.simple_key_allowed = true;
        self.stream_start_produced = true;
        self.tokens.push_back(Token {
            data: TokenData::StreamStart {
                encoding: self.reader.encoding,
            },
            start_mark: mark,
            end_mark: mark,
        });
    }

    fn fetch_stream_end(&mut self) -> Result<(), ScannerError> {
        if self.reader.mark().column != 0 {
            self.reader.mark.column = 0;
            self.reader.mark.line += 1;
        }
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        let mark = self.reader.mark();
        self.tokens.push_back(Token {
            data: TokenData::StreamEnd,
            start_mark: mark,
            end_mark: mark,
        });
        Ok(())
    }

    fn fetch_directive(&mut self) -> Result<(), ScannerError> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_directive()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_document_indicator(&mut self, data: TokenData) -> Result<(), ScannerError> {
        self.unroll_indent(-1);
        self.remove_simple_key()?;
        self.simple_key_allowed = false;
        let start_mark = self.reader.mark();
        self.reader.skip();
        self.reader.skip();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token {
            data,
            start_mark,
            end_mark,
        });
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, data: TokenData) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.increase_flow_level();
        self.simple_key_allowed = true;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token {
            data,
            start_mark,
            end_mark,
        });
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, data: TokenData) -> Result<(), ScannerError> {
        self.remove_simple_key()?;
        self.decrease_flow_level();
        self.simple_key_allowed = false;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token {
            data,
            start_mark,
            end_mark,
        });
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> Result<(), ScannerError> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token {
            data: TokenData::FlowEntry,
            start_mark,
            end_mark,
        });
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> Result<(), ScannerError> {
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return self.set_scanner_error(
                    "",
                    self.reader.mark(),
                    "block sequence entries are not allowed in this context",
                );
            }
            let mark = self.reader.mark();
            self.roll_indent(
                mark.column as i64,
                None,
                TokenData::BlockSequenceStart,
                mark,
            );
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token {
            data: TokenData::BlockEntry,
            start_mark,
            end_mark,
        });
        Ok(())
    }

    fn fetch_key(&mut self) -> Result<(), ScannerError> {
        if self.flow_level == 0 {
            if !self.simple_key_allowed {
                return self.set_scanner_error(
                    "",
                    self.reader.mark(),
                    "mapping keys are not allowed in this context",
                );
            }
            let mark = self.reader.mark();
            self.roll_indent(mark.column as i64, None, TokenData::BlockMappingStart, mark);
        }
        self.remove_simple_key()?;
        self.simple_key_allowed = self.flow_level == 0;
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token {
            data: TokenData::Key,
            start_mark,
            end_mark,
        });
        Ok(())
    }

    fn fetch_value(&mut self) -> Result<(), ScannerError> {
        let simple_key = self.simple_keys.last_mut().unwrap();
        if simple_key.possible {
            // The recorded position retroactively becomes a KEY.
            let token = Token {
                data: TokenData::Key,
                start_mark: simple_key.mark,
                end_mark: simple_key.mark,
            };
            let token_number = simple_key.token_number;
            let mark = simple_key.mark;
            simple_key.possible = false;
            self.tokens
                .insert(token_number - self.tokens_parsed, token);
            self.roll_indent(
                mark.column as i64,
                Some(token_number),
                TokenData::BlockMappingStart,
                mark,
            );
            self.simple_key_allowed = false;
        } else {
            if self.flow_level == 0 {
                if !self.simple_key_allowed {
                    return self.set_scanner_error(
                        "",
                        self.reader.mark(),
                        "mapping values are not allowed in this context",
                    );
                }
                let mark = self.reader.mark();
                self.roll_indent(mark.column as i64, None, TokenData::BlockMappingStart, mark);
            }
            self.simple_key_allowed = self.flow_level == 0;
        }
        let start_mark = self.reader.mark();
        self.reader.skip();
        let end_mark = self.reader.mark();
        self.tokens.push_back(Token {
            data: TokenData::Value,
            start_mark,
            end_mark,
        });
        Ok(())
    }

    fn fetch_anchor(&mut self, alias: bool) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_anchor(alias)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_tag(&mut self) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_tag()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_block_scalar(&mut self, literal: bool) -> Result<(), ScannerError> {
        self.remove_simple_key()?;
        self.simple_key_allowed = true;
        let token = self.scan_block_scalar(literal)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_flow_scalar(&mut self, single: bool) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_flow_scalar(single)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_plain_scalar(&mut self) -> Result<(), ScannerError> {
        self.save_simple_key()?;
        self.simple_key_allowed = false;
        let token = self.scan_plain_scalar()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn scan_to_next_token(&mut self) -> Result<(), ScannerError> {
        loop {
            self.reader.cache(1)?;
            if self.reader.mark().column == 0 && is_bom(self.reader.peek()) {
                self.reader.skip();
            }
            self.reader.cache(1)?;
            while self.reader.check(' ')
                || (self.flow_level != 0 || !self.simple_key_allowed) && self.reader.check('\t')
            {
                self.reader.skip();
                self.reader.cache(1)?;
            }
            if self.reader.check('#') {
                while !is_breakz(self.reader.peek()) {
                    self.reader.skip();
                    self.reader.cache(1)?;
                }
            }
            if !is_break(self.reader.peek()) {
                break;
            }
            self.reader.cache(2)?;
            self.reader.skip_line();
            if self.flow_level == 0 {
                // A line break re-enables simple keys in block context.
                self.simple_key_allowed = true;
            }
        }
        Ok(())
    }

    fn scan_directive(&mut self) -> Result<Token, ScannerError> {
        let start_mark = self.reader.mark();
        self.reader.skip();
        let name = self.scan_directive_name(start_mark)?;
        let token = if name == "YAML" {
            let (major, minor) = self.scan_version_directive_value(start_mark)?;
            Token {
                data: TokenData::VersionDirective { major, minor },
                start_mark,
                end_mark: self.reader.mark(),
            }
        } else if name == "TAG" {
            let (handle, prefix) = self.scan_tag_directive_value(start_mark)?;
            Token {
                data: TokenData::TagDirective { handle, prefix },
                start_mark,
                end_mark: self.reader.mark(),
            }
        } else {
            return self.set_scanner_error(
                "while scanning a directive",
                start_mark,
                "found unknown directive name",
            );
        };
        self.reader.cache(1)?;
        while is_blank(self.reader.peek()) {
            self.reader.skip();
            self.reader.cache(1)?;
        }
        if self.reader.check('#') {
            while !is_breakz(self.reader.peek()) {
                self.reader.skip();
                self.reader.cache(1)?;
            }
        }
        if !is_breakz(self.reader.peek()) {
            self.set_scanner_error(
                "while scanning a directive",
                start_mark,
                "did not find expected comment or line break",
            )
        } else {
            if is_break(self.reader.peek()) {
                self.reader.cache(2)?;
                self.reader.skip_line();
            }
            Ok(token)
        }
    }

    fn scan_directive_name(&mut self, start_mark: Mark) -> Result<String, ScannerError> {
        let mut string = String::new();
        self.reader.cache(1)?;
        while is_alpha(self.reader.peek()) {
            self.reader.read_char(&mut string);
            self.reader.cache(1)?;
        }
        if string.is_empty() {
            self.set_scanner_error(
                "while scanning a directive",
                start_mark,
                "could not find expected directive name",
            )
        } else if !is_blankz(self.reader.peek()) {
            self.set_scanner_error(
                "while scanning a directive",
                start_mark,
                "found unexpected non-alphabetical character",
            )
        } else {
            Ok(string)
        }
    }

    fn scan_version_directive_value(
        &mut self,
        start_mark: Mark,
    ) -> Result<(i32, i32), ScannerError> {
        self.reader.cache(1)?;
        while is_blank(self.reader.peek()) {
            self.reader.skip();
            self.reader.cache(1)?;
        }
        let major = self.scan_version_directive_number(start_mark)?;
        if !self.reader.check('.') {
            return self.set_scanner_error(
                "while scanning a %YAML directive",
                start_mark,
                "did not find expected digit or '.' character",
            );
        }
        self.reader.skip();
        let minor = self.scan_version_directive_number(start_mark)?;
        Ok((major, minor))
    }

    fn scan_version_directive_number(&mut self, start_mark: Mark) -> Result<i32, ScannerError> {
        const MAX_NUMBER_LENGTH: usize = 9;
        let mut value: i32 = 0;
        let mut length = 0;
        self.reader.cache(1)?;
        while is_digit(self.reader.peek()) {
            length += 1;
            if length > MAX_NUMBER_LENGTH {
                return self.set_scanner_error(
                    "while scanning a %YAML directive",
                    start_mark,
                    "found extremely long version number",
                );
            }
            value = value * 10 + as_digit(self.reader.peek()) as i32;
            self.reader.skip();
            self.reader.cache(1)?;
        }
        if length == 0 {
            return self.set_scanner_error(
                "while scanning a %YAML directive",
                start_mark,
                "did not find expected version number",
            );
        }
        Ok(value)
    }

    fn scan_tag_directive_value(
        &mut self,
        start_mark: Mark,
    ) -> Result<(String, String), ScannerError> {
        self.reader.cache(1)?;
        while is_blank(self.reader.peek()) {
            self.reader.skip();
            self.reader.cache(1)?;
        }
        let handle = self.scan_tag_handle(true, start_mark)?;
        self.reader.cache(1)?;
        if !is_blank(self.reader.peek()) {
            return self.set_scanner_error(
                "while scanning a %TAG directive",
                start_mark,
                "did not find expected whitespace",
            );
        }
        while is_blank(self.reader.peek()) {
            self.reader.skip();
            self.reader.cache(1)?;
        }
        let prefix = self.scan_tag_uri(true, true, None, start_mark)?;
        self.reader.cache(1)?;
        if !is_blankz(self.reader.peek()) {
            return self.set_scanner_error(
                "while scanning a %TAG directive",
                start_mark,
                "did not find expected whitespace or line break",
            );
        }
        Ok((handle, prefix))
    }

    fn scan_anchor(&mut self, alias: bool) -> Result<Token, ScannerError> {
        let mut string = String::new();
        let start_mark = self.reader.mark();
        self.reader.skip();
        self.reader.cache(1)?;
        while is_alpha(self.reader.peek()) {
            self.reader.read_char(&mut string);
            self.reader.cache(1)?;
        }
        let end_mark = self.reader.mark();
        if string.is_empty()
            || !(is_blankz(self.reader.peek())
                || matches!(
                    self.reader.peek(),
                    Some('?' | ':' | ',' | ']' | '}' | '%' | '@' | '`')
                ))
        {
            self.set_scanner_error(
                if alias {
                    "while scanning an alias"
                } else {
                    "while scanning an anchor"
                },
                start_mark,
                "did not find expected alphabetic or numeric character",
            )
        } else {
            Ok(Token {
                data: if alias {
                    TokenData::Alias { value: string }
                } else {
                    TokenData::Anchor { value: string }
                },
                start_mark,
                end_mark,
            })
        }
    }

    fn scan_tag(&mut self) -> Result<Token, ScannerError> {
        let start_mark = self.reader.mark();
        self.reader.cache(2)?;

        let data;
        if self.reader.check_at('<', 1) {
            // Verbatim form: !<uri>
            self.reader.skip();
            self.reader.skip();
            let suffix = self.scan_tag_uri(true, false, None, start_mark)?;
            if !self.reader.check('>') {
                return self.set_scanner_error(
                    "while scanning a tag",
                    start_mark,
                    "did not find the expected '>'",
                );
            }
            self.reader.skip();
            data = TokenData::tag("", &suffix);
        } else {
            let handle = self.scan_tag_handle(false, start_mark)?;
            if handle.starts_with('!') && handle.len() > 1 && handle.ends_with('!') {
                let suffix = self.scan_tag_uri(false, false, None, start_mark)?;
                data = TokenData::tag(&handle, &suffix);
            } else {
                let suffix = self.scan_tag_uri(false, false, Some(&handle), start_mark)?;
                if suffix.is_empty() {
                    // A lone '!' is the non-specific tag.
                    data = TokenData::tag("", "!");
                } else {
                    data = TokenData::tag("!", &suffix);
                }
            }
        }

        self.reader.cache(1)?;
        if !is_blankz(self.reader.peek())
            && !(self.flow_level != 0 && self.reader.check(','))
        {
            return self.set_scanner_error(
                "while scanning a tag",
                start_mark,
                "did not find expected whitespace or line break",
            );
        }
        Ok(Token {
            data,
            start_mark,
            end_mark: self.reader.mark(),
        })
    }

    fn scan_tag_handle(&mut self, directive: bool, start_mark: Mark) -> Result<String, ScannerError> {
        let mut string = String::new();
        self.reader.cache(1)?;
        if !self.reader.check('!') {
            return self.set_scanner_error(
                if directive {
                    "while scanning a tag directive"
                } else {
                    "while scanning a tag"
                },
                start_mark,
                "did not find expected '!'",
            );
        }
        self.reader.read_char(&mut string);
        self.reader.cache(1)?;
        while is_alpha(self.reader.peek()) {
            self.reader.read_char(&mut string);
            self.reader.cache(1)?;
        }
        if self.reader.check('!') {
            self.reader.read_char(&mut string);
        } else if directive && string != "!" {
            return self.set_scanner_error(
                "while parsing a tag directive",
                start_mark,
                "did not find expected '!'",
            );
        }
        Ok(string)
    }

    fn scan_tag_uri(
        &mut self,
        uri_char: bool,
        directive: bool,
        head: Option<&str>,
        start_mark: Mark,
    ) -> Result<String, ScannerError> {
        let head = head.unwrap_or("");
        let mut length = head.len();
        let mut string = String::new();
        if length > 1 {
            string = String::from(&head[1..]);
        }
        self.reader.cache(1)?;

        loop {
            let ch = self.reader.peek();
            let accepted = is_alpha(ch)
                || matches!(
                    ch,
                    Some(
                        ';' | '/' | '?' | ':' | '@' | '&' | '=' | '+' | '$' | '.' | '%' | '!'
                            | '~' | '*' | '\'' | '(' | ')'
                    )
                )
                || uri_char && matches!(ch, Some(',' | '[' | ']'));
            if !accepted {
                break;
            }
            if self.reader.check('%') {
                self.scan_uri_escapes(directive, start_mark, &mut string)?;
            } else {
                self.reader.read_char(&mut string);
            }
            length += 1;
            self.reader.cache(1)?;
        }
        if length == 0 {
            self.set_scanner_error(
                if directive {
                    "while parsing a %TAG directive"
                } else {
                    "while parsing a tag"
                },
                start_mark,
                "did not find expected tag URI",
            )
        } else {
            Ok(string)
        }
    }

    fn scan_uri_escapes(
        &mut self,
        directive: bool,
        start_mark: Mark,
        string: &mut String,
    ) -> Result<(), ScannerError> {
        let context = if directive {
            "while parsing a %TAG directive"
        } else {
            "while parsing a tag"
        };
        let mut width = 0;
        let mut value: u32 = 0;
        loop {
            self.reader.cache(3)?;
            if !(self.reader.check('%')
                && is_hex(self.reader.peek_at(1))
                && is_hex(self.reader.peek_at(2)))
            {
                return self.set_scanner_error(
                    context,
                    start_mark,
                    "did not find URI escaped octet",
                );
            }
            let octet =
                ((as_hex(self.reader.peek_at(1)) << 4) + as_hex(self.reader.peek_at(2))) as u8;
            if width == 0 {
                width = if octet & 0x80 == 0 {
                    1
                } else if octet & 0xE0 == 0xC0 {
                    2
                } else if octet & 0xF0 == 0xE0 {
                    3
                } else if octet & 0xF8 == 0xF0 {
                    4
                } else {
                    0
                };
                if width == 0 {
                    return self.set_scanner_error(
                        context,
                        start_mark,
                        "found an incorrect leading UTF-8 octet",
                    );
                }
                value = match width {
                    1 => octet as u32 & 0x7f,
                    2 => octet as u32 & 0x1f,
                    3 => octet as u32 & 0x0f,
                    _ => octet as u32 & 0x07,
                };
            } else {
                if octet & 0xC0 != 0x80 {
                    return self.set_scanner_error(
                        context,
                        start_mark,
                        "found an incorrect trailing UTF-8 octet",
                    );
                }
                value = (value << 6) + (octet as u32 & 0x3f);
            }
            self.reader.skip();
            self.reader.skip();
            self.reader.skip();
            width -= 1;
            if width == 0 {
                break;
            }
        }
        let Some(ch) = char::from_u32(value) else {
            return self.set_scanner_error(
                context,
                start_mark,
                "found an invalid URI escaped character",
            );
        };
        string.push(ch);
        Ok(())
    }

    fn scan_block_scalar(&mut self, literal: bool) -> Result<Token, ScannerError> {
        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        // -1 strips trailing breaks, +1 keeps them, 0 clips to one.
        let mut chomping: i32 = 0;
        let mut increment: i32 = 0;
        let mut indent: i32 = 0;
        let mut leading_blank = false;
        let start_mark = self.reader.mark();
        self.reader.skip();
        self.reader.cache(1)?;

        // The chomping indicator and the indent increment may come in
        // either order.
        if self.reader.check('+') || self.reader.check('-') {
            chomping = if self.reader.check('+') { 1 } else { -1 };
            self.reader.skip();
            self.reader.cache(1)?;
            if is_digit(self.reader.peek()) {
                if self.reader.check('0') {
                    return self.set_scanner_error(
                        "while scanning a block scalar",
                        start_mark,
                        "found an indentation indicator equal to 0",
                    );
                }
                increment = as_digit(self.reader.peek()) as i32;
                self.reader.skip();
            }
        } else if is_digit(self.reader.peek()) {
            if self.reader.check('0') {
                return self.set_scanner_error(
                    "while scanning a block scalar",
                    start_mark,
                    "found an indentation indicator equal to 0",
                );
            }
            increment = as_digit(self.reader.peek()) as i32;
            self.reader.skip();
            self.reader.cache(1)?;
            if self.reader.check('+') || self.reader.check('-') {
                chomping = if self.reader.check('+') { 1 } else { -1 };
                self.reader.skip();
            }
        }

        self.reader.cache(1)?;
        while is_blank(self.reader.peek()) {
            self.reader.skip();
            self.reader.cache(1)?;
        }
        if self.reader.check('#') {
            while !is_breakz(self.reader.peek()) {
                self.reader.skip();
                self.reader.cache(1)?;
            }
        }
        if !is_breakz(self.reader.peek()) {
            return self.set_scanner_error(
                "while scanning a block scalar",
                start_mark,
                "did not find expected comment or line break",
            );
        }
        if is_break(self.reader.peek()) {
            self.reader.cache(2)?;
            self.reader.skip_line();
        }

        let mut end_mark = self.reader.mark();
        if increment != 0 {
            indent = if self.indent >= 0 {
                self.indent + increment
            } else {
                increment
            };
        }
        self.scan_block_scalar_breaks(&mut indent, &mut trailing_breaks, start_mark, &mut end_mark)?;

        self.reader.cache(1)?;
        loop {
            if !(self.reader.mark().column as i32 == indent && self.reader.peek().is_some()) {
                break;
            }
            let trailing_blank = is_blank(self.reader.peek());
            // Folded style: a single break between non-indented content
            // lines becomes a space.
            if !literal && leading_break.starts_with('\n') && !leading_blank && !trailing_blank {
                if trailing_breaks.is_empty() {
                    string.push(' ');
                }
                leading_break.clear();
            } else {
                string.push_str(&leading_break);
                leading_break.clear();
            }
            string.push_str(&trailing_breaks);
            trailing_breaks.clear();
            leading_blank = is_blank(self.reader.peek());
            while !is_breakz(self.reader.peek()) {
                self.reader.read_char(&mut string);
                self.reader.cache(1)?;
            }
            self.reader.cache(2)?;
            if is_break(self.reader.peek()) {
                self.reader.read_line(&mut leading_break);
            }
            self.scan_block_scalar_breaks(
                &mut indent,
                &mut trailing_breaks,
                start_mark,
                &mut end_mark,
            )?;
        }

        if chomping != -1 {
            string.push_str(&leading_break);
        }
        if chomping == 1 {
            string.push_str(&trailing_breaks);
        }

        Ok(Token {
            data: TokenData::Scalar {
                value: string,
                style: if literal {
                    ScalarStyle::Literal
                } else {
                    ScalarStyle::Folded
                },
            },
            start_mark,
            end_mark,
        })
    }

    fn scan_block_scalar_breaks(
        &mut self,
        indent: &mut i32,
        breaks: &mut String,
        start_mark: Mark,
        end_mark: &mut Mark,
    ) -> Result<(), ScannerError> {
        let mut max_indent = 0;
        *end_mark = self.reader.mark();
        loop {
            self.reader.cache(1)?;
            while (*indent == 0 || (self.reader.mark().column as i32) < *indent)
                && is_space(self.reader.peek())
            {
                self.reader.skip();
                self.reader.cache(1)?;
            }
            if self.reader.mark().column as i32 > max_indent {
                max_indent = self.reader.mark().column as i32;
            }
            if (*indent == 0 || (self.reader.mark().column as i32) < *indent)
                && is_tab(self.reader.peek())
            {
                return self.set_scanner_error(
                    "while scanning a block scalar",
                    start_mark,
                    "found a tab character where an indentation space is expected",
                );
            }
            if !is_break(self.reader.peek()) {
                break;
            }
            self.reader.cache(2)?;
            self.reader.read_line(breaks);
            *end_mark = self.reader.mark();
        }
        if *indent == 0 {
            *indent = max_indent.max(self.indent + 1).max(1);
        }
        Ok(())
    }

    fn scan_flow_scalar(&mut self, single: bool) -> Result<Token, ScannerError> {
        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();
        let mut leading_blanks;

        let start_mark = self.reader.mark();
        self.reader.skip();
        loop {
            self.reader.cache(4)?;
            if self.reader.mark().column == 0
                && (self.reader.check_at('-', 0)
                    && self.reader.check_at('-', 1)
                    && self.reader.check_at('-', 2)
                    || self.reader.check_at('.', 0)
                        && self.reader.check_at('.', 1)
                        && self.reader.check_at('.', 2))
                && is_blankz(self.reader.peek_at(3))
            {
                return self.set_scanner_error(
                    "while scanning a quoted scalar",
                    start_mark,
                    "found unexpected document indicator",
                );
            }
            if self.reader.peek().is_none() {
                return self.set_scanner_error(
                    "while scanning a quoted scalar",
                    start_mark,
                    "found unexpected end of stream",
                );
            }
            self.reader.cache(2)?;
            leading_blanks = false;
            while !is_blankz(self.reader.peek()) {
                if single && self.reader.check_at('\'', 0) && self.reader.check_at('\'', 1) {
                    // An escaped single quote.
                    string.push('\'');
                    self.reader.skip();
                    self.reader.skip();
                } else {
                    if self.reader.check(if single { '\'' } else { '"' }) {
                        break;
                    }
                    if !single && self.reader.check('\\') && is_break(self.reader.peek_at(1)) {
                        // An escaped line break folds into nothing.
                        self.reader.cache(3)?;
                        self.reader.skip();
                        self.reader.skip_line();
                        leading_blanks = true;
                        break;
                    } else if !single && self.reader.check('\\') {
                        let mut code_length = 0usize;
                        match self.reader.peek_at(1) {
                            Some('0') => string.push('\0'),
                            Some('a') => string.push('\x07'),
                            Some('b') => string.push('\x08'),
                            Some('t' | '\t') => string.push('\t'),
                            Some('n') => string.push('\n'),
                            Some('v') => string.push('\x0B'),
                            Some('f') => string.push('\x0C'),
                            Some('r') => string.push('\r'),
                            Some('e') => string.push('\x1B'),
                            Some(' ') => string.push(' '),
                            Some('"') => string.push('"'),
                            Some('/') => string.push('/'),
                            Some('\\') => string.push('\\'),
                            // NEL (#x85)
                            Some('N') => string.push('\u{0085}'),
                            // #xA0
                            Some('_') => string.push('\u{00a0}'),
                            // LS (#x2028)
                            Some('L') => string.push('\u{2028}'),
                            // PS (#x2029)
                            Some('P') => string.push('\u{2029}'),
                            Some('x') => code_length = 2,
                            Some('u') => code_length = 4,
                            Some('U') => code_length = 8,
                            _ => {
                                return self.set_scanner_error(
                                    "while parsing a quoted scalar",
                                    start_mark,
                                    "found unknown escape character",
                                );
                            }
                        }
                        self.reader.skip();
                        self.reader.skip();
                        if code_length != 0 {
                            let mut value: u32 = 0;
                            self.reader.cache(code_length)?;
                            for k in 0..code_length {
                                if !is_hex(self.reader.peek_at(k)) {
                                    return self.set_scanner_error(
                                        "while parsing a quoted scalar",
                                        start_mark,
                                        "did not find expected hexdecimal number",
                                    );
                                }
                                value = (value << 4) + as_hex(self.reader.peek_at(k));
                            }
                            if let Some(ch) = char::from_u32(value) {
                                string.push(ch);
                            } else {
                                return self.set_scanner_error(
                                    "while parsing a quoted scalar",
                                    start_mark,
                                    "found invalid Unicode character escape code",
                                );
                            }
                            for _ in 0..code_length {
                                self.reader.skip();
                            }
                        }
                    } else {
                        self.reader.read_char(&mut string);
                    }
                }
                self.reader.cache(2)?;
            }
            self.reader.cache(1)?;
            if self.reader.check(if single { '\'' } else { '"' }) {
                break;
            }
            self.reader.cache(1)?;
            while is_blank(self.reader.peek()) || is_break(self.reader.peek()) {
                if is_blank(self.reader.peek()) {
                    if leading_blanks {
                        self.reader.skip();
                    } else {
                        self.reader.read_char(&mut whitespaces);
                    }
                } else {
                    self.reader.cache(2)?;
                    if leading_blanks {
                        self.reader.read_line(&mut trailing_breaks);
                    } else {
                        whitespaces.clear();
                        self.reader.read_line(&mut leading_break);
                        leading_blanks = true;
                    }
                }
                self.reader.cache(1)?;
            }
            if leading_blanks {
                // Quoted scalars fold like plain scalars: one break becomes
                // a space, N breaks become N-1 breaks.
                if leading_break.starts_with('\n') {
                    if trailing_breaks.is_empty() {
                        string.push(' ');
                    } else {
                        string.push_str(&trailing_breaks);
                        trailing_breaks.clear();
                    }
                    leading_break.clear();
                } else {
                    string.push_str(&leading_break);
                    string.push_str(&trailing_breaks);
                    leading_break.clear();
                    trailing_breaks.clear();
                }
            } else {
                string.push_str(&whitespaces);
                whitespaces.clear();
            }
        }

        self.reader.skip();
        Ok(Token {
            data: TokenData::Scalar {
                value: string,
                style: if single {
                    ScalarStyle::SingleQuoted
                } else {
                    ScalarStyle::DoubleQuoted
                },
            },
            start_mark,
            end_mark: self.reader.mark(),
        })
    }

    fn scan_plain_scalar(&mut self) -> Result<Token, ScannerError> {
        let mut string = String::new();
        let mut leading_break = String::new();
        let mut trailing_breaks = String::new();
        let mut whitespaces = String::new();
        let mut leading_blanks = false;
        let indent = self.indent + 1;
        let start_mark = self.reader.mark();
        let mut end_mark = start_mark;
        loop {
            self.reader.cache(4)?;
            if self.reader.mark().column == 0
                && (self.reader.check_at('-', 0)
                    && self.reader.check_at('-', 1)
                    && self.reader.check_at('-', 2)
                    || self.reader.check_at('.', 0)
                        && self.reader.check_at('.', 1)
                        && self.reader.check_at('.', 2))
                && is_blankz(self.reader.peek_at(3))
            {
                break;
            }
            if self.reader.check('#') {
                break;
            }
            while !is_blankz(self.reader.peek()) {
                if self.flow_level != 0
                    && self.reader.check(':')
                    && matches!(
                        self.reader.peek_at(1),
                        Some(',' | '?' | '[' | ']' | '{' | '}')
                    )
                {
                    return self.set_scanner_error(
                        "while scanning a plain scalar",
                        start_mark,
                        "found unexpected ':'",
                    );
                }
                if self.reader.check(':') && is_blankz(self.reader.peek_at(1))
                    || self.flow_level != 0
                        && matches!(self.reader.peek(), Some(',' | '[' | ']' | '{' | '}'))
                {
                    break;
                }
                if leading_blanks || !whitespaces.is_empty() {
                    if leading_blanks {
                        if leading_break.starts_with('\n') {
                            if trailing_breaks.is_empty() {
                                string.push(' ');
                            } else {
                                string.push_str(&trailing_breaks);
                                trailing_breaks.clear();
                            }
                            leading_break.clear();
                        } else {
                            string.push_str(&leading_break);
                            string.push_str(&trailing_breaks);
                            leading_break.clear();
                            trailing_breaks.clear();
                        }
                        leading_blanks = false;
                    } else {
                        string.push_str(&whitespaces);
                        whitespaces.clear();
                    }
                }
                self.reader.read_char(&mut string);
                end_mark = self.reader.mark();
                self.reader.cache(2)?;
            }
            if !(is_blank(self.reader.peek()) || is_break(self.reader.peek())) {
                break;
            }
            self.reader.cache(1)?;

            while is_blank(self.reader.peek()) || is_break(self.reader.peek()) {
                if is_blank(self.reader.peek()) {
                    if leading_blanks
                        && (self.reader.mark().column as i32) < indent
                        && is_tab(self.reader.peek())
                    {
                        return self.set_scanner_error(
                            "while scanning a plain scalar",
                            start_mark,
                            "found a tab character that violates indentation",
                        );
                    }
                    if leading_blanks {
                        self.reader.skip();
                    } else {
                        self.reader.read_char(&mut whitespaces);
                    }
                } else {
                    self.reader.cache(2)?;
                    if leading_blanks {
                        self.reader.read_line(&mut trailing_breaks);
                    } else {
                        whitespaces.clear();
                        self.reader.read_line(&mut leading_break);
                        leading_blanks = true;
                    }
                }
                self.reader.cache(1)?;
            }
            if self.flow_level == 0 && (self.reader.mark().column as i32) < indent {
                break;
            }
        }

        if leading_blanks {
            self.simple_key_allowed = true;
        }
        Ok(Token {
            data: TokenData::Scalar {
                value: string,
                style: ScalarStyle::Plain,
            },
            start_mark,
            end_mark,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens_of(input: &str) -> Vec<TokenData> {
        let mut bytes = input.as_bytes();
        let mut scanner = Scanner::new();
        scanner.set_input_string(&mut bytes);
        let mut out = Vec::new();
        loop {
            let token = scanner.scan().unwrap();
            let is_end = matches!(token.data, TokenData::StreamEnd);
            out.push(token.data);
            if is_end {
                break;
            }
        }
        out
    }

    fn scalar(value: &str, style: ScalarStyle) -> TokenData {
        TokenData::Scalar {
            value: String::from(value),
            style,
        }
    }

    #[test]
    fn block_mapping_from_simple_key() {
        let tokens = tokens_of("key: value\n");
        assert_eq!(
            tokens,
            vec![
                TokenData::StreamStart {
                    encoding: Encoding::Utf8
                },
                TokenData::BlockMappingStart,
                TokenData::Key,
                scalar("key", ScalarStyle::Plain),
                TokenData::Value,
                scalar("value", ScalarStyle::Plain),
                TokenData::BlockEnd,
                TokenData::StreamEnd,
            ]
        );
    }

    #[test]
    fn every_block_start_has_a_block_end() {
        let tokens = tokens_of("a:\n  - 1\n  - b: 2\n    c: 3\n");
        let starts = tokens
            .iter()
            .filter(|t| {
                matches!(
                    t,
                    TokenData::BlockMappingStart | TokenData::BlockSequenceStart
                )
            })
            .count();
        let ends = tokens
            .iter()
            .filter(|t| matches!(t, TokenData::BlockEnd))
            .count();
        assert_eq!(starts, ends);
    }

    #[test]
    fn flow_collection_tokens() {
        let tokens = tokens_of("[a, {b: c}]");
        assert_eq!(
            tokens,
            vec![
                TokenData::StreamStart {
                    encoding: Encoding::Utf8
                },
                TokenData::FlowSequenceStart,
                scalar("a", ScalarStyle::Plain),
                TokenData::FlowEntry,
                TokenData::FlowMappingStart,
                TokenData::Key,
                scalar("b", ScalarStyle::Plain),
                TokenData::Value,
                scalar("c", ScalarStyle::Plain),
                TokenData::FlowMappingEnd,
                TokenData::FlowSequenceEnd,
                TokenData::StreamEnd,
            ]
        );
    }

    #[test]
    fn block_scalar_clip_keep_strip() {
        let clip = tokens_of("|\n  text\n\n\n");
        assert!(clip.contains(&scalar("text\n", ScalarStyle::Literal)));

        let keep = tokens_of("|+\n  text\n\n\n");
        assert!(keep.contains(&scalar("text\n\n\n", ScalarStyle::Literal)));

        let strip = tokens_of("|-\n  text\n\n\n");
        assert!(strip.contains(&scalar("text", ScalarStyle::Literal)));
    }

    #[test]
    fn folded_scalar_joins_lines() {
        let tokens = tokens_of(">\n  one\n  two\n\n  three\n");
        assert!(tokens.contains(&scalar("one two\nthree\n", ScalarStyle::Folded)));
    }

    #[test]
    fn block_scalar_zero_indent_indicator_rejected() {
        let mut bytes: &[u8] = b"|0\n  text\n";
        let mut scanner = Scanner::new();
        scanner.set_input_string(&mut bytes);
        let mut result = Ok(());
        loop {
            match scanner.scan() {
                Ok(token) => {
                    if matches!(token.data, TokenData::StreamEnd) {
                        break;
                    }
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        assert!(result.is_err());
    }

    #[test]
    fn double_quoted_escapes() {
        let tokens = tokens_of("\"a\\tb\\u263A\\x41\\L\"");
        assert!(tokens.contains(&scalar("a\tb\u{263A}A\u{2028}", ScalarStyle::DoubleQuoted)));
    }

    #[test]
    fn single_quote_escape_and_folding() {
        let tokens = tokens_of("'it''s\nfolded'");
        assert!(tokens.contains(&scalar("it's folded", ScalarStyle::SingleQuoted)));
    }

    #[test]
    fn directives_and_document_markers() {
        let tokens = tokens_of("%YAML 1.1\n%TAG !e! tag:example.com,2000:\n---\nx\n...\n");
        assert!(tokens.contains(&TokenData::VersionDirective { major: 1, minor: 1 }));
        assert!(tokens.contains(&TokenData::TagDirective {
            handle: String::from("!e!"),
            prefix: String::from("tag:example.com,2000:"),
        }));
        assert!(tokens.contains(&TokenData::DocumentStart));
        assert!(tokens.contains(&TokenData::DocumentEnd));
    }

    #[test]
    fn tag_token_divider_splits_handle_and_suffix() {
        let mut bytes: &[u8] = b"!!str x\n";
        let mut scanner = Scanner::new();
        scanner.set_input_string(&mut bytes);
        loop {
            let token = scanner.scan().unwrap();
            if let TokenData::Tag { .. } = &token.data {
                assert_eq!(token.tag_handle(), Some("!!"));
                assert_eq!(token.tag_suffix(), Some("str"));
                break;
            }
            assert!(!matches!(token.data, TokenData::StreamEnd));
        }
    }

    #[test]
    fn simple_key_within_limit_succeeds() {
        let long_key = "k".repeat(1024);
        let input = format!("{long_key}: v\n");
        let tokens = tokens_of(&input);
        assert!(tokens.contains(&TokenData::Key));
    }

    #[test]
    fn simple_key_over_limit_fails() {
        let long_key = "k".repeat(1025);
        let input = format!("{long_key}: v\n");
        let mut bytes = input.as_bytes();
        let mut scanner = Scanner::new();
        scanner.set_input_string(&mut bytes);
        let mut failed = false;
        loop {
            match scanner.scan() {
                Ok(token) => {
                    if matches!(token.data, TokenData::StreamEnd) {
                        break;
                    }
                }
                Err(_) => {
                    failed = true;
                    break;
                }
            }
        }
        assert!(failed);
    }
}
