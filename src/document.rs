use crate::{
    CollectionStyle, MappingStyle, Mark, ScalarStyle, SequenceStyle, TagDirective,
    VersionDirective, DEFAULT_MAPPING_TAG, DEFAULT_SCALAR_TAG, DEFAULT_SEQUENCE_TAG,
};

/// The document structure.
///
/// Nodes live in an arena indexed by 1-based ids, so aliased nodes are
/// shared by id rather than by pointer.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Document {
    /// The document nodes.
    pub nodes: Vec<Node>,
    /// The version directive.
    pub version_directive: Option<VersionDirective>,
    /// The list of tag directives.
    pub tag_directives: Vec<TagDirective>,
    /// Is the document start indicator implicit?
    pub start_implicit: bool,
    /// Is the document end indicator implicit?
    pub end_implicit: bool,
    /// The beginning of the document.
    pub start_mark: Mark,
    /// The end of the document.
    pub end_mark: Mark,
}

/// The node structure.
#[derive(Clone, Default, Debug)]
#[non_exhaustive]
pub struct Node {
    /// The node type.
    pub data: NodeData,
    /// The resolved node tag.
    pub tag: Option<String>,
    /// The beginning of the node.
    pub start_mark: Mark,
    /// The end of the node.
    pub end_mark: Mark,
}

/// Node types.
#[derive(Clone, Default, Debug)]
pub enum NodeData {
    /// An empty node.
    #[default]
    NoNode,
    /// A scalar node.
    Scalar {
        /// The scalar value.
        value: String,
        /// The scalar style.
        style: ScalarStyle,
    },
    /// A sequence node.
    Sequence {
        /// The stack of sequence items.
        items: Vec<NodeItem>,
        /// The sequence style.
        style: SequenceStyle,
    },
    /// A mapping node.
    Mapping {
        /// The stack of mapping pairs (key, value).
        pairs: Vec<NodePair>,
        /// The mapping style.
        style: MappingStyle,
    },
}

/// An element of a sequence node.
pub type NodeItem = i32;

/// An element of a mapping node.
#[derive(Copy, Clone, Default, Debug)]
#[non_exhaustive]
pub struct NodePair {
    /// The key of the element.
    pub key: i32,
    /// The value of the element.
    pub value: i32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(None, &[], false, false)
    }
}

impl Document {
    /// Create a YAML document.
    pub fn new(
        version_directive: Option<VersionDirective>,
        tag_directives: &[TagDirective],
        start_implicit: bool,
        end_implicit: bool,
    ) -> Document {
        Document {
            nodes: Vec::with_capacity(16),
            version_directive,
            tag_directives: tag_directives.to_vec(),
            start_implicit,
            end_implicit,
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        }
    }

    /// Get a node of a YAML document.
    ///
    /// Returns the node object or `None` if `index` is out of range.
    pub fn get_node(&self, index: i32) -> Option<&Node> {
        self.nodes.get(index as usize - 1)
    }

    /// Get a node of a YAML document.
    ///
    /// Returns the node object or `None` if `index` is out of range.
    pub fn get_node_mut(&mut self, index: i32) -> Option<&mut Node> {
        self.nodes.get_mut(index as usize - 1)
    }

    /// Get the root of a YAML document node.
    ///
    /// The root object is the first object added to the document.
    ///
    /// Returns the node object or `None` if the document is empty.
    pub fn get_root_node(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Create a SCALAR node and attach it to the document.
    ///
    /// The `style` argument may be ignored by the emitter.
    ///
    /// Returns the node id.
    #[must_use]
    pub fn add_scalar(&mut self, tag: Option<&str>, value: &str, style: ScalarStyle) -> i32 {
        let tag = tag.unwrap_or(DEFAULT_SCALAR_TAG);
        self.nodes.push(Node {
            data: NodeData::Scalar {
                value: String::from(value),
                style,
            },
            tag: Some(String::from(tag)),
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        });
        self.nodes.len() as i32
    }

    /// Create a SEQUENCE node and attach it to the document.
    ///
    /// The `style` argument may be ignored by the emitter.
    ///
    /// Returns the node id.
    #[must_use]
    pub fn add_sequence(&mut self, tag: Option<&str>, style: SequenceStyle) -> i32 {
        let tag = tag.unwrap_or(DEFAULT_SEQUENCE_TAG);
        self.nodes.push(Node {
            data: NodeData::Sequence {
                items: Vec::with_capacity(16),
                style,
            },
            tag: Some(String::from(tag)),
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        });
        self.nodes.len() as i32
    }

    /// Create a MAPPING node and attach it to the document.
    ///
    /// The `style` argument may be ignored by the emitter.
    ///
    /// Returns the node id.
    #[must_use]
    pub fn add_mapping(&mut self, tag: Option<&str>, style: MappingStyle) -> i32 {
        let tag = tag.unwrap_or(DEFAULT_MAPPING_TAG);
        self.nodes.push(Node {
            data: NodeData::Mapping {
                pairs: Vec::with_capacity(16),
                style,
            },
            tag: Some(String::from(tag)),
            start_mark: Mark::default(),
            end_mark: Mark::default(),
        });
        self.nodes.len() as i32
    }

    /// Add an item to a SEQUENCE node.
    pub fn append_sequence_item(&mut self, sequence: i32, item: i32) {
        assert!(sequence > 0 && sequence as usize <= self.nodes.len());
        assert!(item > 0 && item as usize <= self.nodes.len());
        if let NodeData::Sequence { items, .. } = &mut self.nodes[sequence as usize - 1].data {
            items.push(item);
        } else {
            panic!("not a sequence node");
        }
    }

    /// Add a pair of a key and a value to a MAPPING node.
    pub fn append_mapping_pair(&mut self, mapping: i32, key: i32, value: i32) {
        assert!(mapping > 0 && mapping as usize <= self.nodes.len());
        assert!(key > 0 && key as usize <= self.nodes.len());
        assert!(value > 0 && value as usize <= self.nodes.len());
        if let NodeData::Mapping { pairs, .. } = &mut self.nodes[mapping as usize - 1].data {
            pairs.push(NodePair { key, value });
        } else {
            panic!("not a mapping node");
        }
    }

    /// Give nodes that carry no style of their own the configured defaults.
    pub fn apply_default_styles(
        &mut self,
        scalar_style: ScalarStyle,
        collection_style: CollectionStyle,
    ) {
        for node in &mut self.nodes {
            match &mut node.data {
                NodeData::Scalar { style, .. } => {
                    if *style == ScalarStyle::Any {
                        *style = scalar_style;
                    }
                }
                NodeData::Sequence { style, .. } => {
                    if *style == SequenceStyle::Any {
                        *style = match collection_style {
                            CollectionStyle::Block => SequenceStyle::Block,
                            CollectionStyle::Flow => SequenceStyle::Flow,
                            CollectionStyle::Any => SequenceStyle::Any,
                        };
                    }
                }
                NodeData::Mapping { style, .. } => {
                    if *style == MappingStyle::Any {
                        *style = match collection_style {
                            CollectionStyle::Block => MappingStyle::Block,
                            CollectionStyle::Flow => MappingStyle::Flow,
                            CollectionStyle::Any => MappingStyle::Any,
                        };
                    }
                }
                NodeData::NoNode => {}
            }
        }
    }

    /// Structural equality of two nodes, by resolved tag and content.
    ///
    /// Used to decide whether a merged key duplicates an existing one.
    pub(crate) fn nodes_equal(&self, a: i32, b: i32) -> bool {
        if a == b {
            return true;
        }
        let (Some(node_a), Some(node_b)) = (self.get_node(a), self.get_node(b)) else {
            return false;
        };
        if node_a.tag != node_b.tag {
            return false;
        }
        match (&node_a.data, &node_b.data) {
            (NodeData::Scalar { value: va, .. }, NodeData::Scalar { value: vb, .. }) => va == vb,
            (NodeData::Sequence { items: ia, .. }, NodeData::Sequence { items: ib, .. }) => {
                ia.len() == ib.len()
                    && ia
                        .iter()
                        .zip(ib.iter())
                        .all(|(x, y)| self.nodes_equal(*x, *y))
            }
            (NodeData::Mapping { pairs: pa, .. }, NodeData::Mapping { pairs: pb, .. }) => {
                pa.len() == pb.len()
                    && pa.iter().zip(pb.iter()).all(|(x, y)| {
                        self.nodes_equal(x.key, y.key) && self.nodes_equal(x.value, y.value)
                    })
            }
            _ => false,
        }
    }
}
