//! Streaming driver: one pass over a PRG export, one row per entity.
//!
//! The reader is forward-only. Outside entity elements nothing is kept but
//! the open-element depth; inside one, only that entity's subtree is
//! materialized, and it is dropped as soon as its row has been produced.
//! An entity nested in another is emitted when it closes and left behind
//! as an empty element, so the outer entity never sees its content.

use std::fs::File;
use std::io::BufReader;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde::Serialize;

use crate::config::READ_BUFFER_CAPACITY;
use crate::error::{PrgError, Result};
use crate::fields::{FieldPreset, FieldSchema};
use crate::flatten::Flattener;
use crate::namespaces::NamespaceTable;
use crate::registry::{EntityKind, EntityRegistry};
use crate::types::Row;
use crate::xml::{element_from_start, Element, SubtreeBuilder};

/// Options controlling a parse run.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Use the reduced "basic" field schema.
    pub only_basic_fields: bool,
    /// Fields removed from every kind after the preset is applied.
    pub removed_fields: Vec<String>,
    /// Entity kinds to emit.
    pub kinds: Vec<EntityKind>,
    /// Pre-resolved namespaces; skips sniffing when set.
    pub namespaces: Option<NamespaceTable>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            only_basic_fields: false,
            removed_fields: Vec::new(),
            kinds: EntityKind::ALL.to_vec(),
            namespaces: None,
        }
    }
}

impl ParserOptions {
    /// Select the basic or full field schema.
    #[must_use]
    pub fn basic(mut self, only_basic_fields: bool) -> Self {
        self.only_basic_fields = only_basic_fields;
        self
    }

    /// Remove fields from every kind.
    #[must_use]
    pub fn remove_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.removed_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Restrict output to the given entity kinds.
    #[must_use]
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Reuse an already-resolved namespace table.
    #[must_use]
    pub fn namespaces(mut self, namespaces: NamespaceTable) -> Self {
        self.namespaces = Some(namespaces);
        self
    }
}

/// A configured parser for one PRG file.
///
/// Construction resolves namespaces and fixes the field schema; each call to
/// [`PrgParser::stream`] re-opens the file and scans it from the start.
#[derive(Debug, Clone)]
pub struct PrgParser {
    path: PathBuf,
    size_bytes: u64,
    namespaces: NamespaceTable,
    registry: EntityRegistry,
    schema: FieldSchema,
}

impl PrgParser {
    /// Create a parser with the full or basic field schema.
    ///
    /// # Errors
    /// Returns `PrgError::Configuration` for an empty path and `PrgError::Io`
    /// if the file cannot be read.
    pub fn new(path: impl AsRef<Path>, only_basic_fields: bool) -> Result<Self> {
        Self::with_options(path, ParserOptions::default().basic(only_basic_fields))
    }

    /// Create a parser with explicit options.
    ///
    /// # Errors
    /// Returns `PrgError::Configuration` for an empty path, an empty kind
    /// selection, or a schema left without fields for some kind; and
    /// `PrgError::Io` if the file cannot be read.
    pub fn with_options(path: impl AsRef<Path>, options: ParserOptions) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(PrgError::Configuration(
                "File path must not be empty".to_string(),
            ));
        }

        let namespaces = match options.namespaces {
            Some(namespaces) => namespaces,
            None => NamespaceTable::from_file(path)?,
        };
        let registry = EntityRegistry::with_kinds(&namespaces, &options.kinds)?;

        let preset = FieldPreset::from_basic_flag(options.only_basic_fields);
        let mut schema = FieldSchema::new(preset);
        schema.remove_fields(&options.removed_fields)?;

        let size_bytes = std::fs::metadata(path)?.len();

        tracing::debug!(
            path = %path.display(),
            preset = ?preset,
            entities = ?registry.filter(),
            size_bytes,
            "Parser configured"
        );

        Ok(Self {
            path: path.to_path_buf(),
            size_bytes,
            namespaces,
            registry,
            schema,
        })
    }

    /// Path of the input file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Input size in MiB, rounded to four decimals.
    #[must_use]
    pub fn size_mb(&self) -> f64 {
        let mb = self.size_bytes as f64 / 1024.0 / 1024.0;
        (mb * 10_000.0).round() / 10_000.0
    }

    /// Resolved namespaces.
    #[must_use]
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Entity registry for this run.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Field schema for this run.
    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Flattener bound to this parser's configuration.
    #[must_use]
    pub fn flattener(&self) -> Flattener<'_> {
        Flattener::new(&self.namespaces, &self.registry, &self.schema)
    }

    /// Open the file and start streaming rows.
    ///
    /// # Errors
    /// Returns `PrgError::Parse` wrapping the I/O error if the file cannot
    /// be opened.
    pub fn stream(&self) -> Result<EntityStream<'_>> {
        let file = File::open(&self.path).map_err(|e| PrgError::from(e).in_file(&self.path, 0))?;
        let reader = NsReader::from_reader(BufReader::with_capacity(READ_BUFFER_CAPACITY, file));

        Ok(EntityStream {
            parser: self,
            flattener: self.flattener(),
            reader,
            buf: Vec::with_capacity(8192),
            capture: None,
            document: Document::default(),
            stats: StreamStats::default(),
            finished: false,
        })
    }
}

/// Counters describing a stream's progress and memory use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Rows emitted so far.
    pub records: u64,
    /// Deepest open element chain seen.
    pub peak_open_depth: usize,
    /// Largest number of entity subtrees held at once.
    pub peak_retained_entities: usize,
    /// Largest number of element nodes materialized at once.
    pub peak_retained_nodes: usize,
}

/// The entity subtree currently being read.
#[derive(Debug)]
struct Capture {
    builder: SubtreeBuilder,
    /// Entities open inside the subtree, with the builder depth of each.
    entities: Vec<(EntityKind, usize)>,
}

/// What one reader event amounts to.
enum Step {
    Continue,
    Complete(EntityKind, Element),
    Eof,
}

/// Where the reader stands relative to the root element.
#[derive(Debug, Default)]
struct Document {
    depth: usize,
    root_seen: bool,
    root_closed: bool,
}

impl Document {
    fn error(reason: impl Into<String>) -> PrgError {
        PrgError::Invariant {
            element: "#document".to_string(),
            reason: reason.into(),
        }
    }

    /// Reject an element starting after the root element has closed.
    fn enter(&mut self) -> Result<()> {
        if self.depth == 0 {
            if self.root_closed {
                return Err(Self::error("element after the root element"));
            }
            self.root_seen = true;
        }
        Ok(())
    }

    fn open(&mut self) -> Result<()> {
        self.enter()?;
        self.depth += 1;
        Ok(())
    }

    fn empty(&mut self) -> Result<()> {
        self.enter()?;
        if self.depth == 0 {
            self.root_closed = true;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| Self::error("end tag at document level"))?;
        if self.depth == 0 {
            self.root_closed = true;
        }
        Ok(())
    }

    /// Only whitespace may appear outside the root element.
    fn text(&self, raw: &[u8]) -> Result<()> {
        if self.depth > 0 {
            return Ok(());
        }
        let text = String::from_utf8_lossy(raw);
        if text
            .trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
            .is_empty()
        {
            Ok(())
        } else {
            Err(Self::error("text outside the root element"))
        }
    }

    fn finish(&self) -> Result<()> {
        if self.depth > 0 {
            return Err(Self::error(format!(
                "document ended with {} unclosed elements",
                self.depth
            )));
        }
        if !self.root_seen {
            return Err(Self::error("no root element"));
        }
        Ok(())
    }
}

/// Lazy, single-pass sequence of rows from one file.
///
/// Yields `Err` at most once; the stream is finished afterwards. Dropping the
/// stream closes the file, also mid-way through.
pub struct EntityStream<'p> {
    parser: &'p PrgParser,
    flattener: Flattener<'p>,
    reader: NsReader<BufReader<File>>,
    buf: Vec<u8>,
    capture: Option<Capture>,
    document: Document,
    stats: StreamStats,
    finished: bool,
}

impl EntityStream<'_> {
    /// Progress and memory counters so far.
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Byte offset of the reader in the input.
    #[must_use]
    pub fn byte_position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Advance to the next complete entity and turn it into a row.
    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            match self.step()? {
                Step::Continue => {}
                Step::Eof => return Ok(None),
                Step::Complete(kind, element) => {
                    let record = self.flattener.flatten(kind, &element);
                    drop(element);

                    self.stats.records += 1;
                    let values = record.project(self.parser.schema.fields(kind));
                    return Ok(Some(Row { kind, values }));
                }
            }
        }
    }

    /// Read one event and update the capture state.
    fn step(&mut self) -> Result<Step> {
        self.buf.clear();
        let event = self.reader.read_event_into(&mut self.buf)?;

        let step = match event {
            Event::Start(start) => {
                self.document.open()?;
                self.stats.peak_open_depth = self.stats.peak_open_depth.max(self.document.depth);

                let kind = match_entity(&self.reader, self.parser.registry(), &start);
                if let Some(capture) = self.capture.as_mut() {
                    capture.builder.open(element_from_start(&self.reader, &start)?);
                    if let Some(kind) = kind {
                        capture.entities.push((kind, capture.builder.depth()));
                    }
                } else if let Some(kind) = kind {
                    let root = element_from_start(&self.reader, &start)?;
                    self.capture = Some(Capture {
                        builder: SubtreeBuilder::new(root),
                        entities: vec![(kind, 1)],
                    });
                }
                Step::Continue
            }
            Event::Empty(start) => {
                self.document.empty()?;

                match match_entity(&self.reader, self.parser.registry(), &start) {
                    Some(kind) => {
                        let element = element_from_start(&self.reader, &start)?;
                        if let Some(capture) = self.capture.as_mut() {
                            // The enclosing entity keeps an emptied placeholder.
                            capture.builder.empty(Element::new(element.name.clone()))?;
                        }
                        Step::Complete(kind, element)
                    }
                    None => {
                        if let Some(capture) = self.capture.as_mut() {
                            capture.builder.empty(element_from_start(&self.reader, &start)?)?;
                        }
                        Step::Continue
                    }
                }
            }
            Event::End(_) => {
                self.document.close()?;
                close_in_capture(&mut self.capture)?
            }
            Event::Text(text) => {
                match self.capture.as_mut() {
                    Some(capture) => capture.builder.text(&text.unescape()?)?,
                    None => self.document.text(&text)?,
                }
                Step::Continue
            }
            Event::CData(data) => {
                match self.capture.as_mut() {
                    Some(capture) => capture.builder.text(&String::from_utf8_lossy(&data))?,
                    None => self.document.text(&data)?,
                }
                Step::Continue
            }
            Event::Eof => {
                self.document.finish()?;
                Step::Eof
            }
            // Declarations, comments, processing instructions
            _ => Step::Continue,
        };

        let (open_entities, open_nodes) = self
            .capture
            .as_ref()
            .map_or((0, 0), |c| (c.entities.len(), c.builder.node_count()));
        let (done_entities, done_nodes) = match &step {
            Step::Complete(_, element) => (1, element.element_count()),
            _ => (0, 0),
        };
        self.stats.peak_retained_entities = self
            .stats
            .peak_retained_entities
            .max(open_entities + done_entities);
        self.stats.peak_retained_nodes = self.stats.peak_retained_nodes.max(open_nodes + done_nodes);

        Ok(step)
    }
}

/// Close the innermost captured element, completing an entity if it is one.
fn close_in_capture(slot: &mut Option<Capture>) -> Result<Step> {
    let Some(capture) = slot.as_mut() else {
        return Ok(Step::Continue);
    };

    let depth = capture.builder.depth();
    match capture.entities.last().copied() {
        Some((kind, at)) if at == depth => {
            capture.entities.pop();
            if depth > 1 {
                // Nested entity: emitted now, emptied inside its parent.
                return Ok(Step::Complete(kind, capture.builder.detach()?));
            }
            let root = capture.builder.close()?.ok_or_else(|| PrgError::Invariant {
                element: kind.label().to_string(),
                reason: "entity closed before its subtree".to_string(),
            })?;
            *slot = None;
            Ok(Step::Complete(kind, root))
        }
        _ => {
            capture.builder.close()?;
            Ok(Step::Continue)
        }
    }
}

/// Resolve a start tag and test it against the registry.
fn match_entity<R>(
    reader: &NsReader<R>,
    registry: &EntityRegistry,
    start: &quick_xml::events::BytesStart<'_>,
) -> Option<EntityKind> {
    match reader.resolve_element(start.name()) {
        (ResolveResult::Bound(Namespace(uri)), local) => {
            registry.kind_of_resolved(uri, local.as_ref())
        }
        _ => None,
    }
}

impl Iterator for EntityStream<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finished = true;
                tracing::info!(
                    path = %self.parser.path.display(),
                    records = self.stats.records,
                    "Finished streaming"
                );
                None
            }
            Err(err) => {
                self.finished = true;
                self.capture = None;
                let position = self.byte_position();
                tracing::error!(
                    path = %self.parser.path.display(),
                    position,
                    records = self.stats.records,
                    error = %err,
                    "Something went wrong while parsing"
                );
                Some(Err(err.in_file(&self.parser.path, position)))
            }
        }
    }
}

impl FusedIterator for EntityStream<'_> {}
