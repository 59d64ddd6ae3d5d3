//! Render-independent description of the report layout.
//!
//! The assembler produces these values and the builder turns them into
//! `genpdf` elements. Nothing here references the rendering crate, so the
//! block sequence can be inspected in tests without loading fonts.

/// Which table style a [`TableBlock`] is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    Summary,
    Department,
    Adviser,
}

/// Heading rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadingLevel {
    /// Opening heading of the report body.
    Title,
    /// Heading of a data section.
    Section,
}

/// A heading line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub text: String,
    pub level: HeadingLevel,
}

/// A grid of text cells with a distinguished header row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableBlock {
    pub kind: TableKind,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Redraw the header row at the top of every continuation page.
    pub repeat_header: bool,
}

impl TableBlock {
    /// Number of data rows, excluding the header.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// The "exported by / generated on" line flowed after a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FooterBlock {
    /// Left-aligned text.
    pub left: String,
    /// Right-aligned text.
    pub right: String,
}

/// Individual content blocks that make up a section.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Vertical gap, in points.
    Spacer(f64),
    Heading(Heading),
    Table(TableBlock),
    Footer(FooterBlock),
    /// Explicit page break request.
    PageBreak,
    /// Blocks that must not be split by a page boundary.
    KeepTogether(Vec<Block>),
    /// Zero-height marker recording the page it lands on.
    Anchor(String),
}

impl Block {
    /// Convenience helper for a heading block.
    pub fn heading(text: impl Into<String>, level: HeadingLevel) -> Self {
        Self::Heading(Heading {
            text: text.into(),
            level,
        })
    }

    /// Convenience helper for an anchor block.
    pub fn anchor(name: impl Into<String>) -> Self {
        Self::Anchor(name.into())
    }

    /// Iterates over this block and, for groups, every nested block.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Block> + '_> {
        match self {
            Block::KeepTogether(children) => Box::new(
                std::iter::once(self).chain(children.iter().flat_map(|child| child.walk())),
            ),
            _ => Box::new(std::iter::once(self)),
        }
    }
}

/// Logical representation of a report section.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    identifier: String,
    title: String,
    blocks: Vec<Block>,
}

impl Section {
    /// Creates an empty section.
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Identifier used for anchors and bookmarks.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Human-readable title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Blocks in render order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Appends a block and returns the updated section.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Extends the section with additional blocks and returns the updated instance.
    pub fn with_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.blocks.extend(blocks);
        self
    }

    /// Creates a builder that can close the section with a page break.
    pub fn builder(identifier: impl Into<String>, title: impl Into<String>) -> SectionBuilder {
        SectionBuilder::new(identifier, title)
    }
}

/// Builder for [`Section`] values.
///
/// The section's anchor is always the first block, so its recorded page is
/// the page the section starts on.
#[derive(Clone, Debug, Default)]
pub struct SectionBuilder {
    identifier: String,
    title: String,
    blocks: Vec<Block>,
    page_break_after: bool,
}

impl SectionBuilder {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Ends the section with an explicit page break.
    pub fn page_break_after(mut self, page_break_after: bool) -> Self {
        self.page_break_after = page_break_after;
        self
    }

    /// Pushes an additional block into the section.
    pub fn push_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Extends the builder with multiple blocks.
    pub fn extend_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.blocks.extend(blocks);
        self
    }

    /// Builds the section, inserting the anchor and trailing page break.
    pub fn build(mut self) -> Section {
        if !matches!(self.blocks.first(), Some(Block::Anchor(name)) if *name == self.identifier) {
            self.blocks.insert(0, Block::anchor(self.identifier.clone()));
        }

        if self.page_break_after && !matches!(self.blocks.last(), Some(Block::PageBreak)) {
            self.blocks.push(Block::PageBreak);
        }

        Section::new(self.identifier, self.title).with_blocks(self.blocks)
    }
}

/// The complete, ordered report layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportDocument {
    sections: Vec<Section>,
}

impl ReportDocument {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Top-level blocks of every section, in render order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|section| section.blocks().iter())
    }

    /// Finds a section by identifier.
    pub fn section(&self, identifier: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.identifier() == identifier)
    }
}
