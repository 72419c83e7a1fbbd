//! NeXML document parsing into a [Dataset].

use crate::model::annotation::{AnnotationValue, Annotations};
use crate::model::dataset::{Dataset, NamespaceIndex};
use crate::model::node::{BranchLength, NodeIndex};
use crate::model::taxon_namespace::TaxonIndex;
use crate::model::tree::{Rooting, Tree};
use crate::nexml::xml::{XmlEvent, XmlReader};
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;
use log::{debug, trace, warn};
use std::collections::{HashMap, HashSet};

/// An `otus` element read from the current document.
struct OtusBlock {
    namespace: NamespaceIndex,
    otus: HashMap<String, TaxonIndex>,
}

/// A `node` element of a tree before the tree is assembled.
struct PendingNode {
    id: String,
    taxon: Option<TaxonIndex>,
    label: Option<String>,
    is_root: bool,
    annotations: Annotations,
    children: Vec<usize>,
    parent: Option<usize>,
    length: Option<BranchLength>,
}

// =#========================================================================#=
// NEXML PARSER
// =#========================================================================#=
/// Parser for NeXML documents.
///
/// Each `otus` element registers its `otu` labels (or ids, for unlabelled
/// otus) in a namespace of the dataset, the attached one or a new one.
/// Each `trees` element becomes a [TreesBlock](crate::model::TreesBlock)
/// bound to the namespace of the `otus` element it references. Unknown
/// elements are skipped.
///
/// # Example
/// ```
/// use phylosplit::model::Dataset;
/// use phylosplit::nexml::NexmlParser;
/// use phylosplit::parser::ByteParser;
///
/// let input = r#"<nexml version="0.9">
///   <otus id="birds"><otu id="t1" label="Kiwi"/><otu id="t2" label="Emu"/></otus>
///   <trees id="ts" otus="birds">
///     <tree id="tr" label="ratites">
///       <node id="r" root="true"/><node id="a" otu="t1"/><node id="b" otu="t2"/>
///       <edge id="e1" source="r" target="a" length="1.5"/>
///       <edge id="e2" source="r" target="b"/>
///     </tree>
///   </trees>
/// </nexml>"#;
///
/// let mut dataset = Dataset::new();
/// NexmlParser::new(ByteParser::for_str(input)).parse_into(&mut dataset).unwrap();
///
/// let tree = &dataset.trees_blocks()[0][0];
/// assert!(tree.is_rooted());
/// assert_eq!(tree.name(), Some("ratites"));
/// assert_eq!(tree.total_branch_length(), 1.5);
/// ```
pub struct NexmlParser<S: ByteSource> {
    reader: XmlReader<S>,
    otus_blocks: HashMap<String, OtusBlock>,
    last_otus: Option<String>,
}

impl<S: ByteSource> NexmlParser<S> {
    /// Creates a parser over the given byte parser.
    pub fn new(byte_parser: ByteParser<S>) -> Self {
        NexmlParser {
            reader: XmlReader::new(byte_parser),
            otus_blocks: HashMap::new(),
            last_otus: None,
        }
    }

    /// Parses the whole document and appends its taxa and trees to `dataset`.
    ///
    /// # Errors
    /// Returns a [ParsingError] for malformed XML, a missing `nexml` root,
    /// unresolved `otus`/`otu` references (reported as unresolved labels),
    /// or node references that do not form a tree.
    pub fn parse_into(&mut self, dataset: &mut Dataset) -> Result<(), ParsingError> {
        // Root element
        match self.reader.next_event()? {
            XmlEvent::Start { name, self_closing, .. } if name == "nexml" => {
                if self_closing {
                    return Ok(());
                }
            }
            XmlEvent::Eof => return Err(ParsingError::unexpected_eof(self.reader.parser())),
            _ => return Err(self.reader.error(String::from("Expected <nexml> root element"))),
        }

        loop {
            let event = self.reader.next_event()?;
            match &event {
                XmlEvent::Start { name, self_closing, .. } => match name.as_str() {
                    "otus" => self.parse_otus(&event, *self_closing, dataset)?,
                    "trees" => self.parse_trees(&event, *self_closing, dataset)?,
                    _ => self.skip(name, *self_closing)?,
                },
                XmlEvent::End { .. } => break,
                XmlEvent::Text(_) => {}
                XmlEvent::Eof => return Err(ParsingError::unexpected_eof(self.reader.parser())),
            }
        }

        Ok(())
    }
}

// ============================================================================
// Elements (private)
// ============================================================================
impl<S: ByteSource> NexmlParser<S> {
    fn skip(&mut self, name: &str, self_closing: bool) -> Result<(), ParsingError> {
        trace!("Skipping <{name}> element");
        if self_closing {
            Ok(())
        } else {
            self.reader.skip_element()
        }
    }

    fn required<'a>(&self, event: &'a XmlEvent, key: &str, element: &str) -> Result<&'a str, ParsingError> {
        event
            .attribute(key)
            .ok_or_else(|| self.reader.error(format!("Missing attribute '{key}' of <{element}>")))
    }

    /// Parses `<otus id>` with its `<otu id label>` children.
    fn parse_otus(&mut self, start: &XmlEvent, self_closing: bool, dataset: &mut Dataset) -> Result<(), ParsingError> {
        let id = self.required(start, "id", "otus")?.to_string();
        let namespace = dataset.namespace_for_read();
        let mut otus = HashMap::new();

        if !self_closing {
            loop {
                let event = self.reader.next_event()?;
                match &event {
                    XmlEvent::Start { name, self_closing, .. } if name == "otu" => {
                        let otu_id = self.required(&event, "id", "otu")?;
                        let label = event.attribute("label").unwrap_or(otu_id);
                        let taxon = dataset.namespace_mut(namespace).get_or_insert(label);
                        otus.insert(otu_id.to_string(), taxon);
                        if !self_closing {
                            self.reader.skip_element()?;
                        }
                    }
                    XmlEvent::Start { name, self_closing, .. } => self.skip(name, *self_closing)?,
                    XmlEvent::End { .. } => break,
                    XmlEvent::Text(_) => {}
                    XmlEvent::Eof => return Err(ParsingError::unexpected_eof(self.reader.parser())),
                }
            }
        }

        debug!("Parsed otus '{}' with {} otu elements", id, otus.len());
        self.last_otus = Some(id.clone());
        self.otus_blocks.insert(id, OtusBlock { namespace, otus });
        Ok(())
    }

    /// Parses `<trees otus [label]>` with its `<tree>` children.
    fn parse_trees(&mut self, start: &XmlEvent, self_closing: bool, dataset: &mut Dataset) -> Result<(), ParsingError> {
        let otus_id = match start.attribute("otus") {
            Some(otus_id) => otus_id.to_string(),
            None => self
                .last_otus
                .clone()
                .ok_or_else(|| self.reader.error(String::from("<trees> without preceding <otus>")))?,
        };
        if !self.otus_blocks.contains_key(&otus_id) {
            return Err(ParsingError::unresolved_label(self.reader.parser(), format!("otus '{otus_id}'")));
        }

        let mut trees = Vec::new();
        if !self_closing {
            loop {
                let event = self.reader.next_event()?;
                match &event {
                    XmlEvent::Start { name, self_closing, .. } if name == "tree" => {
                        let tree = self.parse_tree(&event, *self_closing, &otus_id)?;
                        trees.push(tree);
                    }
                    XmlEvent::Start { name, self_closing, .. } => self.skip(name, *self_closing)?,
                    XmlEvent::End { .. } => break,
                    XmlEvent::Text(_) => {}
                    XmlEvent::Eof => return Err(ParsingError::unexpected_eof(self.reader.parser())),
                }
            }
        }

        debug!("Parsed trees element with {} trees", trees.len());
        let namespace = self.otus_blocks[&otus_id].namespace;
        let block = dataset.add_trees_block(namespace);
        block.set_title(start.attribute("label").map(str::to_string));
        for tree in trees {
            block.push(tree);
        }
        Ok(())
    }

    /// Parses `<tree>` with `<node>`, `<edge>` and `<rootedge>` children.
    fn parse_tree(&mut self, start: &XmlEvent, self_closing: bool, otus_id: &str) -> Result<Tree, ParsingError> {
        let mut nodes: Vec<PendingNode> = Vec::new();
        let mut node_ids: HashMap<String, usize> = HashMap::new();
        let mut edges: Vec<(String, String, Option<BranchLength>)> = Vec::new();
        let mut root_edge: Option<(String, Option<BranchLength>)> = None;

        if !self_closing {
            loop {
                let event = self.reader.next_event()?;
                match &event {
                    XmlEvent::Start { name, self_closing, .. } if name == "node" => {
                        let pending = self.parse_node(&event, *self_closing, otus_id)?;
                        if node_ids.insert(pending.id.clone(), nodes.len()).is_some() {
                            return Err(self.reader.error(format!("Duplicate node id '{}'", pending.id)));
                        }
                        nodes.push(pending);
                    }
                    XmlEvent::Start { name, self_closing, .. } if name == "edge" => {
                        let source = self.required(&event, "source", "edge")?.to_string();
                        let target = self.required(&event, "target", "edge")?.to_string();
                        let length = self.parse_length(&event)?;
                        edges.push((source, target, length));
                        self.skip(name, *self_closing)?;
                    }
                    XmlEvent::Start { name, self_closing, .. } if name == "rootedge" => {
                        let target = self.required(&event, "target", "rootedge")?.to_string();
                        root_edge = Some((target, self.parse_length(&event)?));
                        self.skip(name, *self_closing)?;
                    }
                    XmlEvent::Start { name, self_closing, .. } => self.skip(name, *self_closing)?,
                    XmlEvent::End { .. } => break,
                    XmlEvent::Text(_) => {}
                    XmlEvent::Eof => return Err(ParsingError::unexpected_eof(self.reader.parser())),
                }
            }
        }

        // Link nodes along edges
        for (source, target, length) in edges {
            let (Some(&s), Some(&t)) = (node_ids.get(&source), node_ids.get(&target)) else {
                return Err(self.reader.error(format!("Edge references unknown node '{source}' or '{target}'")));
            };
            if nodes[t].parent.is_some() {
                return Err(self.reader.error(format!("Node '{target}' has more than one parent")));
            }
            nodes[t].parent = Some(s);
            nodes[t].length = length;
            nodes[s].children.push(t);
        }
        if let Some((target, length)) = root_edge {
            let Some(&t) = node_ids.get(&target) else {
                return Err(self.reader.error(format!("Root edge references unknown node '{target}'")));
            };
            nodes[t].length = length;
        }

        let mut tree = self.assemble(nodes)?;
        if let Some(label) = start.attribute("label") {
            tree.set_name(Some(label.to_string()));
        }
        Ok(tree)
    }

    /// Parses `<node id [otu] [label] [root]>` including its `<meta>` children.
    fn parse_node(&mut self, start: &XmlEvent, self_closing: bool, otus_id: &str) -> Result<PendingNode, ParsingError> {
        let id = self.required(start, "id", "node")?.to_string();
        let taxon = match start.attribute("otu") {
            Some(otu) => {
                let block = &self.otus_blocks[otus_id];
                match block.otus.get(otu) {
                    Some(&taxon) => Some(taxon),
                    None => {
                        return Err(ParsingError::unresolved_label(
                            self.reader.parser(),
                            format!("otu '{otu}' in otus '{otus_id}'"),
                        ));
                    }
                }
            }
            None => None,
        };
        let is_root = matches!(start.attribute("root"), Some("true") | Some("1"));

        let mut annotations = Annotations::new();
        if !self_closing {
            loop {
                let event = self.reader.next_event()?;
                match &event {
                    XmlEvent::Start { name, self_closing, .. } if name == "meta" => {
                        if let (Some(property), Some(content)) = (event.attribute("property"), event.attribute("content")) {
                            let value = match event.attribute("datatype") {
                                Some(datatype) if datatype.ends_with("string") => AnnotationValue::String(content.to_string()),
                                _ => AnnotationValue::infer(content),
                            };
                            annotations.insert(property, value);
                        } else {
                            warn!("Skipping <meta> element without property and content");
                        }
                        self.skip(name, *self_closing)?;
                    }
                    XmlEvent::Start { name, self_closing, .. } => self.skip(name, *self_closing)?,
                    XmlEvent::End { .. } => break,
                    XmlEvent::Text(_) => {}
                    XmlEvent::Eof => return Err(ParsingError::unexpected_eof(self.reader.parser())),
                }
            }
        }

        Ok(PendingNode {
            id,
            taxon,
            label: start.attribute("label").map(str::to_string),
            is_root,
            annotations,
            children: Vec::new(),
            parent: None,
            length: None,
        })
    }

    fn parse_length(&self, event: &XmlEvent) -> Result<Option<BranchLength>, ParsingError> {
        match event.attribute("length") {
            None => Ok(None),
            Some(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(BranchLength::new)
                .map(Some)
                .ok_or_else(|| self.reader.error(format!("Invalid edge length '{text}'"))),
        }
    }

    /// Builds the tree from the linked pending nodes, children before parents.
    fn assemble(&self, mut nodes: Vec<PendingNode>) -> Result<Tree, ParsingError> {
        if nodes.is_empty() {
            return Ok(Tree::new());
        }

        let marked_root = nodes.iter().position(|node| node.is_root);
        let root = match marked_root {
            Some(root) => root,
            None => {
                let mut parentless = nodes.iter().enumerate().filter(|(_, node)| node.parent.is_none());
                match (parentless.next(), parentless.next()) {
                    (Some((root, _)), None) => root,
                    _ => return Err(self.reader.error(String::from("Tree has no unique root node"))),
                }
            }
        };
        if nodes[root].parent.is_some() {
            return Err(self.reader.error(format!("Root node '{}' has a parent", nodes[root].id)));
        }

        let rooting = if marked_root.is_some() { Rooting::Rooted } else { Rooting::Unrooted };
        let mut tree = Tree::with_capacity(nodes.len()).with_rooting(rooting);
        let mut built: Vec<Option<NodeIndex>> = vec![None; nodes.len()];
        let mut seen_taxa = HashSet::new();

        // Iterative post-order: a node is built once all its children are
        let mut stack = vec![(root, false)];
        while let Some((pending, expanded)) = stack.pop() {
            if !expanded {
                stack.push((pending, true));
                for &child in nodes[pending].children.iter().rev() {
                    stack.push((child, false));
                }
                continue;
            }

            let node = &mut nodes[pending];
            let index = if node.children.is_empty() {
                let Some(taxon) = node.taxon else {
                    return Err(self.reader.error(format!("Leaf node '{}' has no otu", node.id)));
                };
                if !seen_taxa.insert(taxon) {
                    return Err(ParsingError::invalid_tree_structure(
                        self.reader.parser(),
                        format!("Taxon of node '{}' occurs more than once in the tree", node.id),
                    ));
                }
                tree.add_leaf(taxon, node.length)
            } else {
                if node.taxon.is_some() {
                    return Err(ParsingError::invalid_tree_structure(
                        self.reader.parser(),
                        format!("Internal node '{}' cannot have an otu", node.id),
                    ));
                }
                let children = node.children.iter().filter_map(|&child| built[child]).collect();
                tree.add_internal(children, node.length)
            };

            let target = tree.node_mut(index);
            target.set_label(node.label.take());
            target.set_annotations(std::mem::take(&mut node.annotations));
            built[pending] = Some(index);
        }

        if built.iter().any(Option::is_none) {
            return Err(self.reader.error(String::from("Tree contains nodes not connected to the root")));
        }

        tree.set_root(built[root].unwrap_or_default());
        Ok(tree)
    }
}
