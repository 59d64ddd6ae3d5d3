//! Report-specific element implementations built on top of `genpdf` primitives.
//!
//! `genpdf` ships paragraphs and frame-decorated tables but has no notion of
//! row shading, repeated header rows or blocks that must stay on one page.
//! The elements here fill those gaps. Elements that take part in a
//! keep-together group also implement [`FlowElement`] so the group can
//! measure its contents before committing to a page.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use image::GenericImageView;

use genpdf::elements::Paragraph;
use genpdf::error::{Context as _, Error};
use genpdf::render::Area;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{Alignment, Context, Element, Mm, Position, RenderResult, Size};

use crate::model::{FooterBlock, TableBlock};
use crate::style::{mm_from_f64, mm_to_f64, pt, FooterStyle, TableStyle};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

/// Natural size of an image when placed at the `genpdf` default resolution.
pub fn estimated_image_size(image: &image::DynamicImage) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / DEFAULT_IMAGE_DPI;
    let height_mm = MM_PER_INCH * (px_height as f64) / DEFAULT_IMAGE_DPI;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Uniform scale factor that fits `natural` into a square box, keeping the aspect ratio.
pub fn fit_scale(natural: Size, side: Mm) -> f64 {
    let width = mm_to_f64(natural.width);
    let height = mm_to_f64(natural.height);
    let largest = width.max(height);
    if largest > f64::EPSILON {
        mm_to_f64(side) / largest
    } else {
        1.0
    }
}

/// Loads an image from `path`, flattening any alpha channel onto an opaque RGB image.
///
/// `genpdf` refuses images with transparency, which most logo PNGs have.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    let image = reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))?;

    if image.color().has_alpha() {
        Ok(image::DynamicImage::ImageRgb8(image.to_rgb8()))
    } else {
        Ok(image)
    }
}

/// Greedy word wrap of `text` into lines no wider than `max_width`.
///
/// Words wider than `max_width` are broken between characters. Empty text
/// yields one empty line so that rows keep their height.
pub fn wrap_text(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if measure(word) > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut pieces = break_word(word, max_width, &measure);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Splits `word` into the longest character runs that fit `max_width`.
///
/// A single character wider than `max_width` still gets a piece of its own.
fn break_word(word: &str, max_width: f64, measure: &impl Fn(&str) -> f64) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for ch in word.chars() {
        current.push(ch);
        if current.chars().nth(1).is_some() && measure(&current) > max_width {
            current.pop();
            pieces.push(std::mem::replace(&mut current, ch.to_string()));
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn text_width(context: &Context, text: &str, style: Style) -> f64 {
    mm_to_f64(StyledString::new(text.to_owned(), style).width(&context.font_cache))
}

/// Renders one line of text starting at `origin`, aligned within `width`.
pub fn draw_text(
    context: &Context,
    area: &Area<'_>,
    origin: Position,
    width: Mm,
    text: &str,
    style: Style,
    alignment: Alignment,
) -> Result<(), Error> {
    let mut cell = area.clone();
    cell.add_offset(origin);
    cell.set_width(width);

    let mut paragraph = Paragraph::new(StyledString::new(text.to_owned(), style));
    paragraph.set_alignment(alignment);
    let result = paragraph.render(context, cell, style)?;
    if result.has_more {
        log::warn!("Text did not fit its {:.1} mm box: {text}", mm_to_f64(width));
    }
    Ok(())
}

/// Width of the strokes `genpdf` draws, in points. It cannot be changed per line.
const STROKE_WIDTH_PT: f64 = 1.0;
/// Distance between the strokes that make up a filled band, in points.
const FILL_STEP_PT: f64 = 0.75;

/// Vertical offsets, in points, of the strokes that cover a band `height_pt` tall.
///
/// The first and last strokes sit half a stroke inside the band edges and no
/// two neighbours are further apart than [`FILL_STEP_PT`], so the band is
/// painted solid.
pub fn fill_offsets(height_pt: f64) -> Vec<f64> {
    let first = STROKE_WIDTH_PT / 2.0;
    let last = height_pt - STROKE_WIDTH_PT / 2.0;
    if last <= first {
        return vec![height_pt / 2.0];
    }

    let steps = ((last - first) / FILL_STEP_PT).ceil() as usize;
    (0..=steps)
        .map(|step| first + (last - first) * step as f64 / steps as f64)
        .collect()
}

/// Paints a solid rectangle with stacked horizontal strokes.
fn fill_rect(area: &Area<'_>, origin: Position, size: Size, color: Color) {
    let style = Style::new().with_color(color);
    let height_pt = mm_to_f64(size.height) / mm_to_f64(pt(1.0));
    for offset in fill_offsets(height_pt) {
        let y = origin.y + pt(offset);
        area.draw_line(
            vec![Position::new(origin.x, y), Position::new(origin.x + size.width, y)],
            style,
        );
    }
}

fn stroke(area: &Area<'_>, from: Position, to: Position, style: Style) {
    area.draw_line(vec![from, to], style);
}

/// An element whose full height can be computed before it is rendered.
pub trait FlowElement: Element {
    /// Height the remaining content needs when laid out at `width`.
    fn measure(&self, context: &Context, width: Mm, style: Style) -> Mm;
}

/// Shared page bookkeeping for one render.
///
/// The page decorator advances the counter; [`AnchorMarker`]s record the page
/// they land on.
#[derive(Clone, Debug, Default)]
pub struct PageTracker {
    current: Rc<Cell<usize>>,
    anchors: Rc<RefCell<Vec<(String, usize)>>>,
}

impl PageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of a new page and returns its 1-based number.
    pub fn start_page(&self) -> usize {
        let page = self.current.get() + 1;
        self.current.set(page);
        page
    }

    /// Number of pages started so far.
    pub fn page_count(&self) -> usize {
        self.current.get()
    }

    fn record(&self, name: &str) {
        let page = self.current.get();
        log::trace!("anchor {name} placed on page {page}");
        self.anchors.borrow_mut().push((name.to_owned(), page));
    }

    /// Page the named anchor landed on.
    pub fn page_of(&self, name: &str) -> Option<usize> {
        self.anchors
            .borrow()
            .iter()
            .find(|(anchor, _)| anchor == name)
            .map(|(_, page)| *page)
    }

    /// All recorded anchors in render order.
    pub fn anchors(&self) -> Vec<(String, usize)> {
        self.anchors.borrow().clone()
    }
}

/// Zero-height element that records the current page in a [`PageTracker`].
pub struct AnchorMarker {
    name: String,
    tracker: PageTracker,
    recorded: bool,
}

impl AnchorMarker {
    pub fn new(name: impl Into<String>, tracker: PageTracker) -> Self {
        Self {
            name: name.into(),
            tracker,
            recorded: false,
        }
    }
}

impl Element for AnchorMarker {
    fn render(
        &mut self,
        _context: &Context,
        _area: Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        if !self.recorded {
            self.tracker.record(&self.name);
            self.recorded = true;
        }
        Ok(RenderResult::default())
    }
}

impl FlowElement for AnchorMarker {
    fn measure(&self, _context: &Context, _width: Mm, _style: Style) -> Mm {
        Mm::default()
    }
}

/// Fixed vertical gap. Truncated at the bottom of a page rather than carried over.
pub struct Spacer {
    height: Mm,
}

impl Spacer {
    pub fn new(height: Mm) -> Self {
        Self { height }
    }

    /// Creates a spacer from a height in points.
    pub fn points(height: f64) -> Self {
        Self::new(pt(height))
    }
}

impl Element for Spacer {
    fn render(
        &mut self,
        _context: &Context,
        area: Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let available = area.size().height;
        let height = if self.height < available {
            self.height
        } else {
            available
        };
        result.size = Size::new(0, height);
        Ok(result)
    }
}

impl FlowElement for Spacer {
    fn measure(&self, _context: &Context, _width: Mm, _style: Style) -> Mm {
        self.height
    }
}

/// Single-line heading followed by a fixed gap.
pub struct HeadingText {
    text: String,
    style: Style,
    space_after: Mm,
}

impl HeadingText {
    pub fn new(text: impl Into<String>, style: Style, space_after: Mm) -> Self {
        Self {
            text: text.into(),
            style,
            space_after,
        }
    }
}

impl Element for HeadingText {
    fn render(
        &mut self,
        context: &Context,
        area: Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let width = area.size().width;
        let height = self.measure(context, width, style);
        if height > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let text = style.and(self.style);
        draw_text(context, &area, Position::new(0, 0), width, &self.text, text, Alignment::Left)?;
        result.size = Size::new(width, height);
        Ok(result)
    }
}

impl FlowElement for HeadingText {
    fn measure(&self, context: &Context, _width: Mm, style: Style) -> Mm {
        style.and(self.style).line_height(&context.font_cache) + self.space_after
    }
}

/// Two-sided footer line: exporter on the left, timestamp on the right.
pub struct FooterLine {
    left: String,
    right: String,
    style: FooterStyle,
}

impl FooterLine {
    pub fn new(block: &FooterBlock, style: FooterStyle) -> Self {
        Self {
            left: block.left.clone(),
            right: block.right.clone(),
            style,
        }
    }
}

impl Element for FooterLine {
    fn render(
        &mut self,
        context: &Context,
        area: Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let width = area.size().width;
        let height = self.measure(context, width, style);
        if height > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let text = style.and(self.style.text());
        let origin = Position::new(0, pt(self.style.padding_top_pt));
        draw_text(context, &area, origin, width, &self.left, text, Alignment::Left)?;
        draw_text(context, &area, origin, width, &self.right, text, Alignment::Right)?;

        result.size = Size::new(width, height);
        Ok(result)
    }
}

impl FlowElement for FooterLine {
    fn measure(&self, context: &Context, _width: Mm, style: Style) -> Mm {
        let line = style.and(self.style.text()).line_height(&context.font_cache);
        pt(self.style.padding_top_pt) + line + pt(self.style.padding_bottom_pt)
    }
}

struct RowLayout {
    cells: Vec<Vec<String>>,
    line_height: Mm,
    height: Mm,
}

/// Grid table with a filled header row, alternating row shading and wrapped,
/// centered cell text.
///
/// When the table continues on a new page the header row is drawn again if
/// `repeat_header` is set. Column widths are fixed fractions of the available
/// width and the table is centered horizontally.
pub struct DataTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    style: TableStyle,
    repeat_header: bool,
    header_drawn: bool,
    next_row: usize,
}

impl DataTable {
    pub fn new(block: &TableBlock, style: &TableStyle) -> Self {
        Self {
            header: block.header.clone(),
            rows: block.rows.clone(),
            style: style.clone(),
            repeat_header: block.repeat_header,
            header_drawn: false,
            next_row: 0,
        }
    }

    fn column_widths(&self, width: Mm) -> Vec<Mm> {
        self.style
            .column_ratios
            .iter()
            .map(|ratio| width * *ratio)
            .collect()
    }

    fn layout_row(&self, context: &Context, cells: &[String], widths: &[Mm], style: Style) -> RowLayout {
        let padding = pt(self.style.padding_horizontal_pt);
        let line_height = style.line_height(&context.font_cache);
        let cells: Vec<Vec<String>> = cells
            .iter()
            .zip(widths)
            .map(|(text, width)| {
                let max_width = mm_to_f64(*width - padding * 2.0);
                wrap_text(text, max_width, |candidate| text_width(context, candidate, style))
            })
            .collect();

        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = line_height * lines as f64 + pt(self.style.padding_vertical_pt) * 2.0;
        RowLayout {
            cells,
            line_height,
            height,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_row(
        &self,
        context: &Context,
        area: &Area<'_>,
        origin: Position,
        widths: &[Mm],
        row: &RowLayout,
        fill: Color,
        style: Style,
    ) -> Result<(), Error> {
        let table_width = widths.iter().fold(Mm::default(), |total, width| total + *width);
        fill_rect(area, origin, Size::new(table_width, row.height), fill);

        let grid = Style::new().with_color(self.style.grid_color);
        let bottom = origin.y + row.height;
        stroke(area, origin, Position::new(origin.x + table_width, origin.y), grid);
        stroke(
            area,
            Position::new(origin.x, bottom),
            Position::new(origin.x + table_width, bottom),
            grid,
        );

        let padding = pt(self.style.padding_horizontal_pt);
        let mut x = origin.x;
        stroke(area, Position::new(x, origin.y), Position::new(x, bottom), grid);
        for (lines, width) in row.cells.iter().zip(widths) {
            let text_height = row.line_height * lines.len() as f64;
            let top = origin.y + (row.height - text_height) / 2.0;
            for (index, line) in lines.iter().enumerate() {
                draw_text(
                    context,
                    area,
                    Position::new(x + padding, top + row.line_height * index as f64),
                    *width - padding * 2.0,
                    line,
                    style,
                    Alignment::Center,
                )?;
            }
            x += *width;
            stroke(area, Position::new(x, origin.y), Position::new(x, bottom), grid);
        }
        Ok(())
    }
}

impl Element for DataTable {
    fn render(
        &mut self,
        context: &Context,
        area: Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let available = area.size().height;
        let widths = self.column_widths(area.size().width);
        let table_width = widths.iter().fold(Mm::default(), |total, width| total + *width);
        let left = (area.size().width - table_width) / 2.0;
        let header_style = style.and(self.style.header_style());
        let body_style = style.and(self.style.body_style());

        let mut y = Mm::default();
        if !self.header_drawn || self.repeat_header {
            let header = self.layout_row(context, &self.header, &widths, header_style);
            let first_row = self
                .rows
                .get(self.next_row)
                .map(|row| self.layout_row(context, row, &widths, body_style).height)
                .unwrap_or_default();
            if header.height + first_row > available {
                result.has_more = true;
                return Ok(result);
            }

            self.draw_row(
                context,
                &area,
                Position::new(left, y),
                &widths,
                &header,
                self.style.header_fill,
                header_style,
            )?;
            y += header.height;
            self.header_drawn = true;
        }

        while self.next_row < self.rows.len() {
            let row = self.layout_row(context, &self.rows[self.next_row], &widths, body_style);
            if y + row.height > available {
                break;
            }

            let fill = self.style.row_fills[self.next_row % self.style.row_fills.len()];
            self.draw_row(
                context,
                &area,
                Position::new(left, y),
                &widths,
                &row,
                fill,
                body_style,
            )?;
            y += row.height;
            self.next_row += 1;
        }

        result.size = Size::new(table_width, y);
        result.has_more = self.next_row < self.rows.len();
        Ok(result)
    }
}

impl FlowElement for DataTable {
    fn measure(&self, context: &Context, width: Mm, style: Style) -> Mm {
        let widths = self.column_widths(width);
        let header_style = style.and(self.style.header_style());
        let body_style = style.and(self.style.body_style());

        let header = if !self.header_drawn || self.repeat_header {
            self.layout_row(context, &self.header, &widths, header_style).height
        } else {
            Mm::default()
        };

        self.rows[self.next_row..].iter().fold(header, |total, row| {
            total + self.layout_row(context, row, &widths, body_style).height
        })
    }
}

/// Where a keep-together group goes relative to the current page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// The group fits in the space left on this page.
    Here,
    /// The group fits an empty page but not this one.
    NextPage,
    /// The group is taller than a page and has to flow.
    Flow,
}

/// Decides where a group of height `group` is placed.
///
/// `deferred` is set once the group has already been pushed to a new page,
/// so a group is never deferred twice.
pub fn placement(group: Mm, available: Mm, page_capacity: Mm, deferred: bool) -> Placement {
    if group <= available {
        Placement::Here
    } else if !deferred && group <= page_capacity {
        Placement::NextPage
    } else {
        Placement::Flow
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GroupState {
    Pending,
    Deferred,
    Rendering { reserve_trailing: bool },
}

/// Renders its children on a single page whenever they fit on one.
///
/// A group taller than a page flows instead, but every page it touches keeps
/// room for the children after the one currently rendering. For a table
/// followed by a footer this means the footer always shares a page with the
/// last table rows.
pub struct KeepTogether {
    children: Vec<Box<dyn FlowElement>>,
    page_capacity: Mm,
    state: GroupState,
    index: usize,
}

impl KeepTogether {
    pub fn new(children: Vec<Box<dyn FlowElement>>, page_capacity: Mm) -> Self {
        Self {
            children,
            page_capacity,
            state: GroupState::Pending,
            index: 0,
        }
    }

    fn trailing_height(&self, context: &Context, width: Mm, style: Style) -> Mm {
        self.children[self.index + 1..]
            .iter()
            .fold(Mm::default(), |total, child| total + child.measure(context, width, style))
    }
}

impl Element for KeepTogether {
    fn render(
        &mut self,
        context: &Context,
        mut area: Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let width = area.size().width;

        if matches!(self.state, GroupState::Pending | GroupState::Deferred) {
            let height = self.measure(context, width, style);
            let deferred = self.state == GroupState::Deferred;
            match placement(height, area.size().height, self.page_capacity, deferred) {
                Placement::Here => {
                    self.state = GroupState::Rendering {
                        reserve_trailing: false,
                    }
                }
                Placement::NextPage => {
                    log::debug!("moving keep-together group to the next page");
                    self.state = GroupState::Deferred;
                    result.size = Size::new(width, 0);
                    result.has_more = true;
                    return Ok(result);
                }
                Placement::Flow => {
                    log::debug!("keep-together group exceeds a page, flowing with reserved trailer");
                    self.state = GroupState::Rendering {
                        reserve_trailing: true,
                    }
                }
            }
        }

        let reserve_trailing = matches!(
            self.state,
            GroupState::Rendering {
                reserve_trailing: true
            }
        );

        while self.index < self.children.len() {
            let mut child_area = area.clone();
            if reserve_trailing {
                let trailing = self.trailing_height(context, width, style);
                let height = child_area.size().height;
                if trailing < height {
                    child_area.set_height(height - trailing);
                }
            }

            let child = self.children[self.index].render(context, child_area, style)?;
            area.add_offset(Position::new(0, child.size.height));
            result.size = result.size.stack_vertical(child.size);
            if child.has_more {
                result.has_more = true;
                return Ok(result);
            }
            self.index += 1;
        }

        Ok(result)
    }
}

impl FlowElement for KeepTogether {
    fn measure(&self, context: &Context, width: Mm, style: Style) -> Mm {
        self.children[self.index..]
            .iter()
            .fold(Mm::default(), |total, child| total + child.measure(context, width, style))
    }
}
