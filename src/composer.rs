use log::debug;

use crate::resolver::NodeKind;
use crate::{
    ComposerError, Document, Event, EventData, Mark, Node, NodeData, NodePair, Parser, Resolver,
    MERGE_TAG,
};

/// An anchor that has been seen in the current document.
struct AliasEntry {
    /// The anchor name.
    anchor: String,
    /// The node id.
    index: i32,
    /// The anchor mark.
    mark: Mark,
    /// Whether the anchored node has finished composing. An alias that
    /// refers to an incomplete entry is a recursive alias.
    complete: bool,
}

/// Drives a [`Parser`] and builds [`Document`] trees.
///
/// Owns the per-document anchor table and applies merge-key flattening and
/// implicit-tag resolution while composing.
#[non_exhaustive]
pub struct Composer<'a, 'r> {
    parser: &'a mut Parser<'r>,
    resolver: Resolver,
    aliases: Vec<AliasEntry>,
    lookahead: Option<Event>,
}

impl<'a, 'r> Composer<'a, 'r> {
    /// Create a composer over `parser` with the default YAML 1.1 resolver.
    pub fn new(parser: &'a mut Parser<'r>) -> Composer<'a, 'r> {
        Self::with_resolver(parser, Resolver::new())
    }

    /// Create a composer with a custom resolver.
    pub fn with_resolver(parser: &'a mut Parser<'r>, resolver: Resolver) -> Composer<'a, 'r> {
        Composer {
            parser,
            resolver,
            aliases: Vec::with_capacity(16),
            lookahead: None,
        }
    }

    fn set_composer_error<T>(problem: &'static str, mark: Mark) -> Result<T, ComposerError> {
        Err(ComposerError::Problem { problem, mark })
    }

    fn set_composer_error_context<T>(
        context: &'static str,
        context_mark: Mark,
        problem: &'static str,
        mark: Mark,
    ) -> Result<T, ComposerError> {
        Err(ComposerError::ProblemWithContext {
            context,
            context_mark,
            problem,
            mark,
        })
    }

    fn ensure_stream_start(&mut self) -> Result<(), ComposerError> {
        if !self.parser.stream_start_produced() {
            let event = self.parser.parse()?;
            if !matches!(event.data, EventData::StreamStart { .. }) {
                return Self::set_composer_error(
                    "did not find expected <stream-start>",
                    event.start_mark,
                );
            }
        }
        Ok(())
    }

    /// Check whether another document follows on the stream.
    ///
    /// Consumes the STREAM-START event the first time it is called.
    pub fn check_node(&mut self) -> Result<bool, ComposerError> {
        self.ensure_stream_start()?;
        if self.lookahead.is_none() {
            if self.parser.stream_end_produced() {
                return Ok(false);
            }
            self.lookahead = Some(self.parser.parse()?);
        }
        Ok(!matches!(
            self.lookahead.as_ref().unwrap().data,
            EventData::StreamEnd
        ))
    }

    /// Compose the next document, or `None` at the end of the stream.
    pub fn get_node(&mut self) -> Result<Option<Document>, ComposerError> {
        self.ensure_stream_start()?;
        let event = match self.lookahead.take() {
            Some(event) => event,
            None => {
                if self.parser.stream_end_produced() {
                    return Ok(None);
                }
                self.parser.parse()?
            }
        };
        if matches!(event.data, EventData::StreamEnd) {
            return Ok(None);
        }
        let document = self.load_document(event)?;
        Ok(Some(document))
    }

    /// Compose the single document of the stream.
    ///
    /// Fails when the stream holds no document or more than one.
    pub fn get_single_node(&mut self) -> Result<Document, ComposerError> {
        let Some(document) = self.get_node()? else {
            return Self::set_composer_error(
                "expected a single document in the stream, but found none",
                Mark::default(),
            );
        };
        if self.check_node()? {
            let mark = self.lookahead.as_ref().map_or(Mark::default(), |event| {
                event.start_mark
            });
            return Self::set_composer_error_context(
                "expected a single document in the stream",
                document.start_mark,
                "but found another document",
                mark,
            );
        }
        Ok(document)
    }

    fn load_document(&mut self, event: Event) -> Result<Document, ComposerError> {
        let EventData::DocumentStart {
            version_directive,
            tag_directives,
            implicit,
        } = event.data
        else {
            return Self::set_composer_error(
                "did not find expected <document-start>",
                event.start_mark,
            );
        };

        self.aliases.clear();
        let mut document = Document::new(version_directive, &tag_directives, implicit, true);
        document.start_mark = event.start_mark;
        let mut ctx: Vec<i32> = Vec::with_capacity(16);

        loop {
            let event = self.parser.parse()?;
            match event.data {
                EventData::DocumentEnd { implicit } => {
                    document.end_implicit = implicit;
                    document.end_mark = event.end_mark;
                    break;
                }
                EventData::Alias { .. } => {
                    self.load_alias(&event, &mut document, &mut ctx)?;
                }
                EventData::Scalar { .. } => {
                    self.load_scalar(event, &mut document, &mut ctx)?;
                }
                EventData::SequenceStart { .. } => {
                    self.load_sequence(event, &mut document, &mut ctx)?;
                }
                EventData::SequenceEnd => {
                    self.load_sequence_end(&event, &mut document, &mut ctx);
                }
                EventData::MappingStart { .. } => {
                    self.load_mapping(event, &mut document, &mut ctx)?;
                }
                EventData::MappingEnd => {
                    self.load_mapping_end(&event, &mut document, &mut ctx)?;
                }
                EventData::StreamStart { .. }
                | EventData::StreamEnd
                | EventData::DocumentStart { .. } => {
                    unreachable!("unexpected event inside a document")
                }
            }
        }

        assert!(ctx.is_empty(), "unbalanced collection events");
        debug!(
            "composed document with {} nodes ({})",
            document.nodes.len(),
            document.start_mark
        );
        Ok(document)
    }

    fn register_anchor(
        &mut self,
        document: &Document,
        index: i32,
        anchor: Option<String>,
        complete: bool,
    ) -> Result<(), ComposerError> {
        let Some(anchor) = anchor else {
            return Ok(());
        };
        let mark = document.nodes[index as usize - 1].start_mark;
        for alias_entry in &self.aliases {
            if alias_entry.anchor == anchor {
                return Self::set_composer_error_context(
                    "found duplicate anchor; first occurrence",
                    alias_entry.mark,
                    "second occurrence",
                    mark,
                );
            }
        }
        debug!("registered anchor &{anchor} for node {index}");
        self.aliases.push(AliasEntry {
            anchor,
            index,
            mark,
            complete,
        });
        Ok(())
    }

    /// Mark the anchor for `index`, if any, as fully composed.
    fn complete_anchor(&mut self, index: i32) {
        for alias_entry in &mut self.aliases {
            if alias_entry.index == index {
                alias_entry.complete = true;
            }
        }
    }

    fn load_node_add(
        document: &mut Document,
        ctx: &mut [i32],
        index: i32,
    ) -> Result<(), ComposerError> {
        let Some(parent_index) = ctx.last() else {
            return Ok(());
        };
        let parent = &mut document.nodes[*parent_index as usize - 1];
        match &mut parent.data {
            NodeData::Sequence { items, .. } => {
                items.push(index);
            }
            NodeData::Mapping { pairs, .. } => {
                let mut do_push = true;
                if let Some(pair) = pairs.last_mut() {
                    if pair.key != 0 && pair.value == 0 {
                        pair.value = index;
                        do_push = false;
                    }
                }
                if do_push {
                    pairs.push(NodePair {
                        key: index,
                        value: 0,
                    });
                }
            }
            _ => unreachable!("parent is not a collection"),
        }
        Ok(())
    }

    fn load_alias(
        &mut self,
        event: &Event,
        document: &mut Document,
        ctx: &mut [i32],
    ) -> Result<(), ComposerError> {
        let EventData::Alias { anchor } = &event.data else {
            unreachable!()
        };

        for alias_entry in &self.aliases {
            if alias_entry.anchor == *anchor {
                if !alias_entry.complete {
                    return Self::set_composer_error_context(
                        "while composing an alias",
                        alias_entry.mark,
                        "found recursive alias",
                        event.start_mark,
                    );
                }
                return Self::load_node_add(document, ctx, alias_entry.index);
            }
        }
        Self::set_composer_error("found undefined alias", event.start_mark)
    }

    fn load_scalar(
        &mut self,
        event: Event,
        document: &mut Document,
        ctx: &mut [i32],
    ) -> Result<(), ComposerError> {
        let EventData::Scalar {
            anchor,
            tag,
            value,
            plain_implicit,
            style,
            ..
        } = event.data
        else {
            unreachable!()
        };

        let tag = self
            .resolver
            .resolve(NodeKind::Scalar, tag.as_deref(), &value, plain_implicit);
        document.nodes.push(Node {
            data: NodeData::Scalar { value, style },
            tag: Some(tag),
            start_mark: event.start_mark,
            end_mark: event.end_mark,
        });
        let index = document.nodes.len() as i32;
        self.register_anchor(document, index, anchor, true)?;
        Self::load_node_add(document, ctx, index)
    }

    fn load_sequence(
        &mut self,
        event: Event,
        document: &mut Document,
        ctx: &mut Vec<i32>,
    ) -> Result<(), ComposerError> {
        let EventData::SequenceStart {
            anchor,
            tag,
            implicit,
            style,
        } = event.data
        else {
            unreachable!()
        };

        let tag = self
            .resolver
            .resolve(NodeKind::Sequence, tag.as_deref(), "", implicit);
        document.nodes.push(Node {
            data: NodeData::Sequence {
                items: Vec::with_capacity(16),
                style,
            },
            tag: Some(tag),
            start_mark: event.start_mark,
            end_mark: event.end_mark,
        });
        let index = document.nodes.len() as i32;
        self.register_anchor(document, index, anchor, false)?;
        Self::load_node_add(document, ctx, index)?;
        ctx.push(index);
        Ok(())
    }

    fn load_sequence_end(&mut self, event: &Event, document: &mut Document, ctx: &mut Vec<i32>) {
        let index = *ctx.last().expect("unbalanced sequence end");
        assert!(matches!(
            document.nodes[index as usize - 1].data,
            NodeData::Sequence { .. }
        ));
        document.nodes[index as usize - 1].end_mark = event.end_mark;
        self.complete_anchor(index);
        let _ = ctx.pop();
    }

    fn load_mapping(
        &mut self,
        event: Event,
        document: &mut Document,
        ctx: &mut Vec<i32>,
    ) -> Result<(), ComposerError> {
        let EventData::MappingStart {
            anchor,
            tag,
            implicit,
            style,
        } = event.data
        else {
            unreachable!()
        };

        let tag = self
            .resolver
            .resolve(NodeKind::Mapping, tag.as_deref(), "", implicit);
        document.nodes.push(Node {
            data: NodeData::Mapping {
                pairs: Vec::with_capacity(16),
                style,
            },
            tag: Some(tag),
            start_mark: event.start_mark,
            end_mark: event.end_mark,
        });
        let index = document.nodes.len() as i32;
        self.register_anchor(document, index, anchor, false)?;
        Self::load_node_add(document, ctx, index)?;
        ctx.push(index);
        Ok(())
    }

    fn load_mapping_end(
        &mut self,
        event: &Event,
        document: &mut Document,
        ctx: &mut Vec<i32>,
    ) -> Result<(), ComposerError> {
        let index = *ctx.last().expect("unbalanced mapping end");
        assert!(matches!(
            document.nodes[index as usize - 1].data,
            NodeData::Mapping { .. }
        ));
        document.nodes[index as usize - 1].end_mark = event.end_mark;
        Self::flatten_mapping(document, index)?;
        self.complete_anchor(index);
        let _ = ctx.pop();
        Ok(())
    }

    /// Replace `<<` pairs with the pairs of the merged mapping(s).
    ///
    /// Merged pairs are appended after the mapping's own pairs; a merged
    /// key that duplicates an already present key is silently dropped
    /// (first occurrence wins).
    fn flatten_mapping(document: &mut Document, index: i32) -> Result<(), ComposerError> {
        let mapping_mark = document.nodes[index as usize - 1].start_mark;
        let pairs = {
            let NodeData::Mapping { pairs, .. } = &mut document.nodes[index as usize - 1].data
            else {
                unreachable!()
            };
            std::mem::take(pairs)
        };
        let mut regular: Vec<NodePair> = Vec::with_capacity(pairs.len());
        let mut merge_values: Vec<i32> = Vec::new();
        for pair in &pairs {
            let key_node = &document.nodes[pair.key as usize - 1];
            if key_node.tag.as_deref() == Some(MERGE_TAG) {
                merge_values.push(pair.value);
            } else {
                regular.push(*pair);
            }
        }

        if merge_values.is_empty() {
            if let NodeData::Mapping { pairs: slot, .. } =
                &mut document.nodes[index as usize - 1].data
            {
                *slot = regular;
            }
            return Ok(());
        }

        let mut candidates: Vec<NodePair> = Vec::new();
        for value_index in merge_values {
            let value_node = &document.nodes[value_index as usize - 1];
            match &value_node.data {
                NodeData::Mapping { pairs, .. } => {
                    candidates.extend(pairs.iter().copied());
                }
                NodeData::Sequence { items, .. } => {
                    for item in items {
                        let item_node = &document.nodes[*item as usize - 1];
                        if let NodeData::Mapping { pairs, .. } = &item_node.data {
                            candidates.extend(pairs.iter().copied());
                        } else {
                            return Self::set_composer_error_context(
                                "while composing a mapping",
                                mapping_mark,
                                "expected a mapping for merging",
                                item_node.start_mark,
                            );
                        }
                    }
                }
                _ => {
                    return Self::set_composer_error_context(
                        "while composing a mapping",
                        mapping_mark,
                        "expected a mapping or a sequence of mappings for merging",
                        value_node.start_mark,
                    );
                }
            }
        }

        let mut merged = regular;
        for candidate in candidates {
            let duplicate = merged
                .iter()
                .any(|pair| document.nodes_equal(pair.key, candidate.key));
            if !duplicate {
                merged.push(candidate);
            }
        }

        if let NodeData::Mapping { pairs: slot, .. } = &mut document.nodes[index as usize - 1].data
        {
            *slot = merged;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compose_one(input: &str) -> Document {
        let mut bytes = input.as_bytes();
        let mut parser = Parser::new();
        parser.set_input_string(&mut bytes);
        let mut composer = Composer::new(&mut parser);
        composer.get_single_node().unwrap()
    }

    fn compose_error(input: &str) -> ComposerError {
        let mut bytes = input.as_bytes();
        let mut parser = Parser::new();
        parser.set_input_string(&mut bytes);
        let mut composer = Composer::new(&mut parser);
        let mut last = None;
        loop {
            match composer.get_node() {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(err) => {
                    last = Some(err);
                    break;
                }
            }
        }
        last.expect("expected a composer error")
    }

    fn scalar_value(document: &Document, index: i32) -> &str {
        match &document.get_node(index).unwrap().data {
            NodeData::Scalar { value, .. } => value,
            _ => panic!("not a scalar"),
        }
    }

    fn root_pairs(document: &Document) -> Vec<NodePair> {
        match &document.get_root_node().unwrap().data {
            NodeData::Mapping { pairs, .. } => pairs.clone(),
            _ => panic!("root is not a mapping"),
        }
    }

    #[test]
    fn resolves_implicit_scalar_tags() {
        let document = compose_one("42\n");
        let root = document.get_root_node().unwrap();
        assert_eq!(root.tag.as_deref(), Some(crate::INT_TAG));
    }

    #[test]
    fn alias_shares_node_identity() {
        let document = compose_one("anchor: &a { x: 1 }\nalias: *a\n");
        let pairs = root_pairs(&document);
        assert_eq!(pairs.len(), 2);
        // Both values are the same arena node.
        assert_eq!(pairs[0].value, pairs[1].value);
    }

    #[test]
    fn merge_key_first_wins() {
        let document = compose_one("<<: { a: 1 }\na: 2\nb: 3\n");
        let pairs = root_pairs(&document);
        assert_eq!(pairs.len(), 2);
        assert_eq!(scalar_value(&document, pairs[0].key), "a");
        assert_eq!(scalar_value(&document, pairs[0].value), "2");
        assert_eq!(scalar_value(&document, pairs[1].key), "b");
        assert_eq!(scalar_value(&document, pairs[1].value), "3");
    }

    #[test]
    fn merge_sequence_flattens_in_order() {
        let document = compose_one(
            "- &one { a: 1 }\n- &two { a: 10, b: 2 }\n- merged:\n    <<: [*one, *two]\n    c: 3\n",
        );
        let root_items = match &document.get_root_node().unwrap().data {
            NodeData::Sequence { items, .. } => items.clone(),
            _ => panic!("root is not a sequence"),
        };
        let merged_outer = match &document.get_node(root_items[2]).unwrap().data {
            NodeData::Mapping { pairs, .. } => pairs.clone(),
            _ => panic!(),
        };
        let merged = match &document.get_node(merged_outer[0].value).unwrap().data {
            NodeData::Mapping { pairs, .. } => pairs.clone(),
            _ => panic!(),
        };
        // c: 3, then a: 1 (from *one), then b: 2 (from *two); *two's a is a
        // duplicate and is dropped.
        assert_eq!(merged.len(), 3);
        assert_eq!(scalar_value(&document, merged[0].key), "c");
        assert_eq!(scalar_value(&document, merged[1].key), "a");
        assert_eq!(scalar_value(&document, merged[1].value), "1");
        assert_eq!(scalar_value(&document, merged[2].key), "b");
    }

    #[test]
    fn merge_with_scalar_value_is_an_error() {
        let err = compose_error("<<: 42\n");
        assert!(matches!(err, ComposerError::ProblemWithContext { .. }));
    }

    #[test]
    fn undefined_alias_is_an_error() {
        let err = compose_error("value: *missing\n");
        assert!(matches!(
            err,
            ComposerError::Problem {
                problem: "found undefined alias",
                ..
            }
        ));
    }

    #[test]
    fn duplicate_anchor_is_an_error() {
        let err = compose_error("a: &x 1\nb: &x 2\n");
        assert!(matches!(err, ComposerError::ProblemWithContext { .. }));
    }

    #[test]
    fn recursive_alias_is_an_error() {
        let err = compose_error("&a\nself: *a\n");
        assert!(matches!(
            err,
            ComposerError::ProblemWithContext {
                problem: "found recursive alias",
                ..
            }
        ));
    }

    #[test]
    fn get_single_node_rejects_two_documents() {
        let mut bytes: &[u8] = b"---\none\n---\ntwo\n";
        let mut parser = Parser::new();
        parser.set_input_string(&mut bytes);
        let mut composer = Composer::new(&mut parser);
        assert!(composer.get_single_node().is_err());
    }

    #[test]
    fn get_single_node_rejects_empty_stream() {
        let mut bytes: &[u8] = b"";
        let mut parser = Parser::new();
        parser.set_input_string(&mut bytes);
        let mut composer = Composer::new(&mut parser);
        assert!(composer.get_single_node().is_err());
    }

    #[test]
    fn check_node_reports_documents() {
        let mut bytes: &[u8] = b"a\n";
        let mut parser = Parser::new();
        parser.set_input_string(&mut bytes);
        let mut composer = Composer::new(&mut parser);
        assert!(composer.check_node().unwrap());
        assert!(composer.get_node().unwrap().is_some());
        assert!(!composer.check_node().unwrap());
        assert!(composer.get_node().unwrap().is_none());
    }
}
