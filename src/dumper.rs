use log::debug;

use crate::emitter::Anchors;
use crate::resolver::NodeKind;
use crate::{
    Document, Emitter, EmitterError, Encoding, Event, EventData, NodeData, Resolver,
    DEFAULT_MAPPING_TAG, DEFAULT_SCALAR_TAG, DEFAULT_SEQUENCE_TAG,
};

impl<'w> Emitter<'w> {
    /// Start a YAML stream.
    ///
    /// This function should be used before [`Document::dump`] is called.
    pub fn open(&mut self) -> Result<(), EmitterError> {
        assert!(!self.opened, "emitter already opened");
        let event = Event::stream_start(Encoding::Any);
        self.emit(event)?;
        self.opened = true;
        Ok(())
    }

    /// Finish a YAML stream.
    ///
    /// This function should be used after [`Document::dump`] is called.
    pub fn close(&mut self) -> Result<(), EmitterError> {
        assert!(self.opened, "emitter was not opened");
        if self.closed {
            return Ok(());
        }
        let event = Event::stream_end();
        self.emit(event)?;
        self.closed = true;
        Ok(())
    }
}

impl Document {
    /// Emit a YAML document.
    ///
    /// The document object may be generated using
    /// [`Composer::get_node()`](crate::Composer::get_node) or built by hand.
    /// The emitter takes responsibility for the document's content.
    ///
    /// Nodes referenced more than once get generated `id001`-style anchors
    /// and are emitted as aliases on later references. Tags that the
    /// default resolver would re-derive from the scalar value are emitted
    /// implicitly.
    pub fn dump(self, emitter: &mut Emitter) -> Result<(), EmitterError> {
        self.dump_with_resolver(emitter, &Resolver::new())
    }

    /// Emit a YAML document, deciding implicit tags with `resolver`.
    pub fn dump_with_resolver(
        mut self,
        emitter: &mut Emitter,
        resolver: &Resolver,
    ) -> Result<(), EmitterError> {
        if !emitter.opened {
            emitter.open()?;
        }
        if self.nodes.is_empty() {
            emitter.close()?;
            return Ok(());
        }

        assert!(emitter.opened, "emitter must be opened");
        debug!("dumping document with {} nodes", self.nodes.len());
        emitter.anchors = vec![Anchors::default(); self.nodes.len()];
        let event = Event::new(EventData::DocumentStart {
            version_directive: self.version_directive,
            tag_directives: core::mem::take(&mut self.tag_directives),
            implicit: self.start_implicit,
        });
        emitter.emit(event)?;
        Self::anchor_node(emitter, &self, 1);
        self.dump_node(emitter, resolver, 1)?;
        let event = Event::new(EventData::DocumentEnd {
            implicit: self.end_implicit,
        });
        emitter.emit(event)?;

        emitter.anchors.clear();
        emitter.last_anchor_id = 0;
        Ok(())
    }

    /// Count references to `index` and its children; a node seen twice
    /// gets an anchor id.
    fn anchor_node(emitter: &mut Emitter, document: &Document, index: i32) {
        emitter.anchors[index as usize - 1].references += 1;
        let references = emitter.anchors[index as usize - 1].references;
        if references == 1 {
            match &document.nodes[index as usize - 1].data {
                NodeData::Sequence { items, .. } => {
                    for item in items {
                        Self::anchor_node(emitter, document, *item);
                    }
                }
                NodeData::Mapping { pairs, .. } => {
                    for pair in pairs {
                        Self::anchor_node(emitter, document, pair.key);
                        Self::anchor_node(emitter, document, pair.value);
                    }
                }
                _ => {}
            }
        } else if references == 2 {
            emitter.last_anchor_id += 1;
            emitter.anchors[index as usize - 1].anchor = emitter.last_anchor_id;
        }
    }

    fn generate_anchor(anchor_id: i32) -> String {
        format!("id{anchor_id:03}")
    }

    fn dump_node(
        &mut self,
        emitter: &mut Emitter,
        resolver: &Resolver,
        index: i32,
    ) -> Result<(), EmitterError> {
        let anchor_id = emitter.anchors[index as usize - 1].anchor;
        let mut anchor: Option<String> = None;
        if anchor_id != 0 {
            anchor = Some(Self::generate_anchor(anchor_id));
        }
        if emitter.anchors[index as usize - 1].serialized {
            return Self::dump_alias(emitter, anchor.expect("serialized node without anchor"));
        }
        emitter.anchors[index as usize - 1].serialized = true;

        let node = core::mem::take(&mut self.nodes[index as usize - 1]);
        match node.data {
            NodeData::Scalar { value, style } => {
                let tag = node.tag;
                let plain_implicit = tag.as_deref()
                    == Some(resolver.resolve(NodeKind::Scalar, None, &value, true).as_str());
                let quoted_implicit = tag.as_deref() == Some(DEFAULT_SCALAR_TAG);
                let event = Event::new(EventData::Scalar {
                    anchor,
                    tag,
                    value,
                    plain_implicit,
                    quoted_implicit,
                    style,
                });
                emitter.emit(event)
            }
            NodeData::Sequence { items, style } => {
                let implicit = node.tag.as_deref() == Some(DEFAULT_SEQUENCE_TAG);
                let event = Event::new(EventData::SequenceStart {
                    anchor,
                    tag: node.tag,
                    implicit,
                    style,
                });
                emitter.emit(event)?;
                for item in items {
                    self.dump_node(emitter, resolver, item)?;
                }
                emitter.emit(Event::new(EventData::SequenceEnd))
            }
            NodeData::Mapping { pairs, style } => {
                let implicit = node.tag.as_deref() == Some(DEFAULT_MAPPING_TAG);
                let event = Event::new(EventData::MappingStart {
                    anchor,
                    tag: node.tag,
                    implicit,
                    style,
                });
                emitter.emit(event)?;
                for pair in pairs {
                    self.dump_node(emitter, resolver, pair.key)?;
                    self.dump_node(emitter, resolver, pair.value)?;
                }
                emitter.emit(Event::new(EventData::MappingEnd))
            }
            NodeData::NoNode => unreachable!("cannot dump an empty node"),
        }
    }

    fn dump_alias(emitter: &mut Emitter, anchor: String) -> Result<(), EmitterError> {
        let event = Event::new(EventData::Alias { anchor });
        emitter.emit(event)
    }
}
