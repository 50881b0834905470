//! Tables: grid access, per-line borders, layered background colors and
//! row/column editing.
//!
//! Every cell's border and background CSS is derived from the `data-*`
//! state on the table, its rows and its cells, so a theme switch or a grid
//! edit only has to call [`TableObject::refresh`].

use crate::common;
use crate::common::BorderInfo;
use crate::common::LayoutMode;
use crate::config::Margins;
use crate::config::ObjectConfig;
use crate::object::ObjectContext;
use crate::object::ObjectProperty;
use crate::object::SelectableObject;
use crate::object::apply_shared;
use crate::object::unsupported;
use lm_core::EditorError;
use lm_core::EditorResult;
use lm_core::Modifiers;
use lm_core::ObjectKind;
use lm_core::Theme;
use lm_css::BorderSide;
use lm_css::BorderStyle;
use lm_css::BorderValue;
use lm_css::CssColor;
use lm_css::format_px;
use lm_css::parse_px;
use lm_dom::Document;
use lm_dom::NodeId;
use lm_dom::Position;
use lm_layout::Point;
use lm_layout::Size;
use serde::Deserialize;
use serde::Serialize;

/// Largest row or column count accepted at insertion.
pub const MAX_TABLE_DIMENSION: usize = 100;
pub const MAX_TABLE_BORDER_PX: u32 = 20;

const ROW_HEIGHT_ESTIMATE: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TableWidth {
    #[serde(rename = "auto")]
    Auto,
    #[default]
    #[serde(rename = "100%")]
    Full,
    #[serde(rename = "75%")]
    ThreeQuarters,
    #[serde(rename = "50%")]
    Half,
}

impl TableWidth {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Full => "100%",
            Self::ThreeQuarters => "75%",
            Self::Half => "50%",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim() {
            "auto" => Some(Self::Auto),
            "100%" | "full" => Some(Self::Full),
            "75%" => Some(Self::ThreeQuarters),
            "50%" | "half" => Some(Self::Half),
            _ => None,
        }
    }
}

/// Arguments of a table insertion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub rows: usize,
    pub cols: usize,
    #[serde(default)]
    pub has_header: bool,
    #[serde(default = "default_border_width")]
    pub border_width: u32,
    #[serde(default)]
    pub width: TableWidth,
    #[serde(default)]
    pub floating: bool,
}

fn default_border_width() -> u32 {
    1
}

impl Default for TableSpec {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 2,
            has_header: false,
            border_width: default_border_width(),
            width: TableWidth::default(),
            floating: false,
        }
    }
}

impl TableSpec {
    pub fn validate(&self) -> EditorResult<()> {
        let dimensions = 1..=MAX_TABLE_DIMENSION;
        if !dimensions.contains(&self.rows) || !dimensions.contains(&self.cols) {
            return Err(EditorError::invalid_argument(
                "objects.table.dimensions",
                format!(
                    "table must have 1-{MAX_TABLE_DIMENSION} rows and columns, got {}x{}",
                    self.rows, self.cols
                ),
            ));
        }
        if self.border_width > MAX_TABLE_BORDER_PX {
            return Err(EditorError::invalid_argument(
                "objects.table.border_width",
                format!("border width {}px exceeds {MAX_TABLE_BORDER_PX}px", self.border_width),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowPosition {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnPosition {
    Before,
    After,
}

/// One drawable grid line family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderLine {
    OuterTop,
    OuterBottom,
    OuterLeft,
    OuterRight,
    InnerHorizontal,
    InnerVertical,
}

impl BorderLine {
    pub const ALL: [Self; 6] = [
        Self::OuterTop,
        Self::OuterBottom,
        Self::OuterLeft,
        Self::OuterRight,
        Self::InnerHorizontal,
        Self::InnerVertical,
    ];

    /// Short code stored in `data-border-sides`.
    pub fn code(self) -> &'static str {
        match self {
            Self::OuterTop => "OT",
            Self::OuterBottom => "OB",
            Self::OuterLeft => "OL",
            Self::OuterRight => "OR",
            Self::InnerHorizontal => "IH",
            Self::InnerVertical => "IV",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OuterTop => "outer-top",
            Self::OuterBottom => "outer-bottom",
            Self::OuterLeft => "outer-left",
            Self::OuterRight => "outer-right",
            Self::InnerHorizontal => "inner-horizontal",
            Self::InnerVertical => "inner-vertical",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Line drawn by `side` of the cell at (`row`, `col`).
    pub fn classify(side: BorderSide, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        match side {
            BorderSide::Top if row == 0 => Self::OuterTop,
            BorderSide::Bottom if row + 1 >= rows => Self::OuterBottom,
            BorderSide::Left if col == 0 => Self::OuterLeft,
            BorderSide::Right if col + 1 >= cols => Self::OuterRight,
            BorderSide::Top | BorderSide::Bottom => Self::InnerHorizontal,
            BorderSide::Left | BorderSide::Right => Self::InnerVertical,
        }
    }
}

/// Set of visible grid lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorderLines {
    bits: u8,
}

impl Default for BorderLines {
    fn default() -> Self {
        Self::ALL
    }
}

impl BorderLines {
    pub const NONE: Self = Self { bits: 0 };
    pub const ALL: Self = Self { bits: 0b11_1111 };

    pub fn contains(self, line: BorderLine) -> bool {
        self.bits & line.bit() != 0
    }

    pub fn insert(&mut self, line: BorderLine) {
        self.bits |= line.bit();
    }

    pub fn lines(self) -> impl Iterator<Item = BorderLine> {
        BorderLine::ALL.into_iter().filter(move |line| self.contains(*line))
    }

    /// Resolves side tokens (`all`, `none`, `outer`, `inner`, `horizontal`,
    /// `vertical`). Orientation tokens restrict the inner lines; on their
    /// own they also pick the matching outer edges.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> EditorResult<Self> {
        let (mut all, mut outer, mut inner, mut horizontal, mut vertical) =
            (false, false, false, false, false);
        for token in tokens {
            match token.as_ref().trim().to_ascii_lowercase().as_str() {
                "all" => all = true,
                "none" | "" => {}
                "outer" => outer = true,
                "inner" => inner = true,
                "horizontal" => horizontal = true,
                "vertical" => vertical = true,
                other => {
                    return Err(EditorError::invalid_argument(
                        "objects.table.border_sides",
                        format!("unknown border side {other:?}"),
                    ));
                }
            }
        }
        if all {
            return Ok(Self::ALL);
        }

        let mut lines = Self::NONE;
        if outer {
            for line in [
                BorderLine::OuterTop,
                BorderLine::OuterBottom,
                BorderLine::OuterLeft,
                BorderLine::OuterRight,
            ] {
                lines.insert(line);
            }
        }
        let edges = !(outer || inner);
        if horizontal {
            lines.insert(BorderLine::InnerHorizontal);
            if edges {
                lines.insert(BorderLine::OuterTop);
                lines.insert(BorderLine::OuterBottom);
            }
        }
        if vertical {
            lines.insert(BorderLine::InnerVertical);
            if edges {
                lines.insert(BorderLine::OuterLeft);
                lines.insert(BorderLine::OuterRight);
            }
        }
        if inner && !(horizontal || vertical) {
            lines.insert(BorderLine::InnerHorizontal);
            lines.insert(BorderLine::InnerVertical);
        }
        Ok(lines)
    }

    pub fn encode(self) -> String {
        self.lines().map(BorderLine::code).collect::<Vec<_>>().join(" ")
    }

    pub fn decode(value: &str) -> Self {
        let mut lines = Self::NONE;
        for code in value.split_whitespace() {
            if let Some(line) = BorderLine::ALL.into_iter().find(|line| line.code() == code) {
                lines.insert(line);
            }
        }
        lines
    }
}

/// Which stored table color a color command changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableColorTarget {
    Table,
    Header,
    Row,
    Column,
    Cell,
    Border,
}

impl TableColorTarget {
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => Some(Self::Table),
            "header" => Some(Self::Header),
            "row" => Some(Self::Row),
            "column" | "col" => Some(Self::Column),
            "cell" => Some(Self::Cell),
            "border" => Some(Self::Border),
            _ => None,
        }
    }

    fn attribute(self) -> &'static str {
        match self {
            Self::Table => "data-bg-color",
            Self::Header => "data-header-bg",
            Self::Row => "data-row-bg",
            Self::Column => "data-col-bg",
            Self::Cell => "data-cell-bg",
            Self::Border => "data-border-color",
        }
    }
}

/// Stored colors around the current cell; `None` means theme default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColors {
    pub table: Option<String>,
    pub header: Option<String>,
    pub row: Option<String>,
    pub column: Option<String>,
    pub cell: Option<String>,
    pub border: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBorderInfo {
    #[serde(flatten)]
    pub border: BorderInfo,
    pub sides: Vec<&'static str>,
}

struct ThemeColors {
    border: &'static str,
    header: &'static str,
}

fn theme_colors(theme: Theme) -> ThemeColors {
    match theme {
        Theme::Light => ThemeColors {
            border: "#cccccc",
            header: "#f0f0f0",
        },
        Theme::Dark => ThemeColors {
            border: "#555555",
            header: "#3a3a3a",
        },
    }
}

pub fn is_cell(doc: &Document, id: NodeId) -> bool {
    doc.is_element(id, "td") || doc.is_element(id, "th")
}

/// Innermost cell containing `node`, inclusive.
pub fn enclosing_cell(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.closest(node, is_cell)
}

/// Table a cell belongs to.
pub fn owning_table(doc: &Document, cell: NodeId) -> Option<NodeId> {
    doc.ancestors(cell)
        .into_iter()
        .find(|id| doc.is_element(*id, "table"))
}

/// Caret at the end of a cell's text, or inside an empty cell.
pub(crate) fn caret_into_cell(doc: &mut Document, cell: NodeId) {
    let position = match doc.last_text_node(cell) {
        Some(text) => Position::new(text, doc.node_length(text)),
        None => Position::new(cell, 0),
    };
    doc.set_caret(position);
}

/// Empty cell styled like `reference`, without its background.
fn copy_cell(doc: &mut Document, reference: NodeId, tag: &str, same_column: bool) -> NodeId {
    let mut style = doc.style(reference);
    let _ = style.remove("background-color");
    let cell = doc.create_element(tag);
    if !style.is_empty() {
        doc.set_style(cell, &style);
    }
    if same_column {
        if let Some(column) = doc.attr(reference, "data-col-bg").map(str::to_owned) {
            doc.set_attr(cell, "data-col-bg", &column);
        }
    }
    let filler = doc.create_element("br");
    doc.append_child(cell, filler);
    cell
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableObject {
    node: NodeId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TableProperties {
    rows: usize,
    columns: usize,
    has_header: bool,
    width: String,
    layout: LayoutMode,
    floating: bool,
    z_index: Option<i32>,
    border: TableBorderInfo,
    colors: TableColors,
    shadow: bool,
    radius: f32,
    margins: Margins,
}

impl TableObject {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    /// Rows in order, looking through `thead`/`tbody`/`tfoot`.
    pub fn rows(&self, doc: &Document) -> Vec<NodeId> {
        let mut rows = Vec::new();
        for child in doc.children(self.node) {
            match doc.tag(*child) {
                Some("tr") => rows.push(*child),
                Some("thead" | "tbody" | "tfoot") => rows.extend(
                    doc.children(*child)
                        .iter()
                        .copied()
                        .filter(|row| doc.is_element(*row, "tr")),
                ),
                _ => {}
            }
        }
        rows
    }

    pub fn grid(&self, doc: &Document) -> Vec<Vec<NodeId>> {
        self.rows(doc)
            .into_iter()
            .map(|row| {
                doc.children(row)
                    .iter()
                    .copied()
                    .filter(|cell| is_cell(doc, *cell))
                    .collect()
            })
            .collect()
    }

    pub fn coordinates(&self, doc: &Document, cell: NodeId) -> Option<(usize, usize)> {
        self.grid(doc).iter().enumerate().find_map(|(r, row)| {
            row.iter().position(|id| *id == cell).map(|c| (r, c))
        })
    }

    /// Cell of this table holding `node`, skipping nested tables' cells.
    pub fn cell_containing(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        std::iter::once(node)
            .chain(doc.ancestors(node))
            .take_while(|id| *id != self.node)
            .filter(|id| is_cell(doc, *id))
            .last()
            .filter(|cell| owning_table(doc, *cell) == Some(self.node))
    }

    pub fn has_header(&self, doc: &Document) -> bool {
        self.rows(doc)
            .first()
            .is_some_and(|row| self.is_header_row(doc, *row))
    }

    fn is_header_row(&self, doc: &Document, row: NodeId) -> bool {
        if doc.parent(row).is_some_and(|parent| doc.is_element(parent, "thead")) {
            return true;
        }
        let cells = doc.children(row);
        !cells.is_empty() && cells.iter().all(|cell| doc.is_element(*cell, "th"))
    }

    pub fn lines(&self, doc: &Document) -> BorderLines {
        doc.attr(self.node, "data-border-sides")
            .map(BorderLines::decode)
            .unwrap_or_default()
    }

    /// Stored border; the color falls back to the theme's.
    pub fn border(&self, doc: &Document, theme: Theme) -> BorderValue {
        let mut border = common::stored_border(
            doc,
            self.node,
            &BorderValue {
                width_px: 1,
                style: BorderStyle::Solid,
                color: None,
            },
        );
        if border.color.is_none() {
            border.color = CssColor::parse(theme_colors(theme).border);
        }
        border
    }

    pub fn border_info(&self, doc: &Document, theme: Theme) -> TableBorderInfo {
        TableBorderInfo {
            border: BorderInfo::from(&self.border(doc, theme)),
            sides: self.lines(doc).lines().map(BorderLine::name).collect(),
        }
    }

    pub fn margins(&self, doc: &Document, config: &ObjectConfig) -> Margins {
        common::margins(doc, self.node, config.default_margins)
    }

    /// Replaces the visible line set.
    pub fn set_border_sides<S: AsRef<str>>(
        &self,
        doc: &mut Document,
        tokens: &[S],
        theme: Theme,
        config: &ObjectConfig,
    ) -> EditorResult<BorderLines> {
        let lines = BorderLines::from_tokens(tokens)?;
        doc.set_attr(self.node, "data-border-sides", &lines.encode());
        self.refresh(doc, theme, config);
        Ok(lines)
    }

    /// Stores `color` for `target`. `none` or an empty value clears it.
    pub fn set_color(
        &self,
        doc: &mut Document,
        target: TableColorTarget,
        color: &str,
        cell: Option<NodeId>,
        theme: Theme,
        config: &ObjectConfig,
    ) -> EditorResult<()> {
        let value = match color.trim() {
            "" | "none" | "default" => None,
            other => Some(common::parse_color(other)?.as_css().to_owned()),
        };
        let holders = match target {
            TableColorTarget::Table | TableColorTarget::Header | TableColorTarget::Border => {
                vec![self.node]
            }
            TableColorTarget::Row | TableColorTarget::Column | TableColorTarget::Cell => {
                let cell = cell.ok_or_else(|| {
                    EditorError::invalid_argument(
                        "objects.table.no_cell",
                        "no current cell for a row, column or cell color",
                    )
                })?;
                match target {
                    TableColorTarget::Row => doc.parent(cell).into_iter().collect(),
                    TableColorTarget::Column => {
                        let (_, col) = self.coordinates(doc, cell).ok_or_else(|| {
                            EditorError::invalid_argument(
                                "objects.table.no_cell",
                                "current cell is not part of the table",
                            )
                        })?;
                        self.grid(doc)
                            .iter()
                            .filter_map(|row| row.get(col).copied())
                            .collect()
                    }
                    _ => vec![cell],
                }
            }
        };
        for holder in holders {
            match &value {
                Some(value) => doc.set_attr(holder, target.attribute(), value),
                None => {
                    let _ = doc.remove_attr(holder, target.attribute());
                }
            }
        }
        self.refresh(doc, theme, config);
        Ok(())
    }

    pub fn colors(&self, doc: &Document, cell: Option<NodeId>) -> TableColors {
        let read = |id: NodeId, name: &str| doc.attr(id, name).map(str::to_owned);
        let row = cell.and_then(|cell| doc.parent(cell));
        TableColors {
            table: read(self.node, "data-bg-color"),
            header: read(self.node, "data-header-bg"),
            row: row.and_then(|row| read(row, "data-row-bg")),
            column: cell.and_then(|cell| read(cell, "data-col-bg")),
            cell: cell.and_then(|cell| read(cell, "data-cell-bg")),
            border: read(self.node, "data-border-color"),
        }
    }

    /// Recomputes every cell's border and background.
    pub fn refresh(&self, doc: &mut Document, theme: Theme, config: &ObjectConfig) {
        let border = self.border(doc, theme);
        let border_css = border.to_css();
        let lines = self.lines(doc);
        let palette = theme_colors(theme);
        let table_bg = doc.attr(self.node, "data-bg-color").map(str::to_owned);
        let header_bg = doc.attr(self.node, "data-header-bg").map(str::to_owned);
        match &table_bg {
            Some(color) => doc.set_style_property(self.node, "background-color", color),
            None => {
                let _ = doc.remove_style_property(self.node, "background-color");
            }
        }
        doc.set_style_property(self.node, "border-collapse", "collapse");

        let rows = self.rows(doc);
        let grid = self.grid(doc);
        for (r, (row, cells)) in rows.iter().zip(&grid).enumerate() {
            let row_bg = doc.attr(*row, "data-row-bg").map(str::to_owned);
            let header_row = self.is_header_row(doc, *row);
            for (c, cell) in cells.iter().enumerate() {
                for side in BorderSide::ALL {
                    let line = BorderLine::classify(side, r, c, grid.len(), cells.len());
                    let value = if lines.contains(line) && border.is_visible() {
                        border_css.as_str()
                    } else {
                        "none"
                    };
                    doc.set_style_property(*cell, side.border_property(), value);
                }
                doc.set_style_property(*cell, "padding", &format_px(config.cell_padding_px));

                let own = doc
                    .attr(*cell, "data-cell-bg")
                    .or_else(|| doc.attr(*cell, "data-col-bg"))
                    .map(str::to_owned)
                    .or_else(|| row_bg.clone());
                let background = if header_row || doc.is_element(*cell, "th") {
                    own.or_else(|| header_bg.clone())
                        .or_else(|| table_bg.clone())
                        .or_else(|| Some(palette.header.to_owned()))
                } else {
                    own
                };
                match background {
                    Some(color) => doc.set_style_property(*cell, "background-color", &color),
                    None => {
                        let _ = doc.remove_style_property(*cell, "background-color");
                    }
                }
            }
        }
    }

    /// Adds a row next to the reference cell's row (or the first/last
    /// row). Returns the first new cell.
    pub fn insert_row(&self, doc: &mut Document, position: RowPosition, reference: Option<NodeId>) -> EditorResult<NodeId> {
        let rows = self.rows(doc);
        let grid = self.grid(doc);
        let index = reference
            .and_then(|cell| self.coordinates(doc, cell))
            .map(|(r, _)| r)
            .unwrap_or(match position {
                RowPosition::Above => 0,
                RowPosition::Below => rows.len().saturating_sub(1),
            });
        let (Some(row), Some(cells)) = (rows.get(index).copied(), grid.get(index)) else {
            return Err(EditorError::invariant("objects.table.empty", "table has no rows"));
        };
        let header_row = self.is_header_row(doc, row);

        let new_row = doc.create_element("tr");
        let mut first = None;
        for cell in cells {
            let tag = if header_row && position == RowPosition::Below {
                "td".to_owned()
            } else {
                doc.tag(*cell).unwrap_or("td").to_owned()
            };
            let copy = copy_cell(doc, *cell, &tag, true);
            doc.append_child(new_row, copy);
            first.get_or_insert(copy);
        }
        if first.is_none() {
            let cell = doc.create_element("td");
            let filler = doc.create_element("br");
            doc.append_child(cell, filler);
            doc.append_child(new_row, cell);
            first = Some(cell);
        }

        let in_head = doc.parent(row).is_some_and(|parent| doc.is_element(parent, "thead"));
        let body = doc
            .parent(row)
            .and_then(|head| doc.next_sibling(head))
            .filter(|next| doc.is_element(*next, "tbody"));
        match (position, in_head, body) {
            (RowPosition::Below, true, Some(body)) => doc.insert_child(body, 0, new_row),
            (RowPosition::Below, _, _) => doc.insert_after(row, new_row),
            (RowPosition::Above, _, _) => doc.insert_before(row, new_row),
        }
        first.ok_or_else(|| EditorError::invariant("objects.table.empty", "new row has no cells"))
    }

    /// Adds a column beside the reference cell's column. Each new cell
    /// mirrors the tag and style of its row's reference cell.
    pub fn insert_column(&self, doc: &mut Document, position: ColumnPosition, reference: Option<NodeId>) -> EditorResult<()> {
        let grid = self.grid(doc);
        if grid.is_empty() {
            return Err(EditorError::invariant("objects.table.empty", "table has no rows"));
        }
        let index = reference
            .and_then(|cell| self.coordinates(doc, cell))
            .map(|(_, c)| c)
            .unwrap_or(match position {
                ColumnPosition::Before => 0,
                ColumnPosition::After => usize::MAX,
            });
        for cells in &grid {
            let Some(last) = cells.len().checked_sub(1) else {
                continue;
            };
            let anchor = cells[index.min(last)];
            let tag = doc.tag(anchor).unwrap_or("td").to_owned();
            let cell = copy_cell(doc, anchor, &tag, false);
            match position {
                ColumnPosition::Before => doc.insert_before(anchor, cell),
                ColumnPosition::After => doc.insert_after(anchor, cell),
            }
        }
        Ok(())
    }

    /// Removes the reference cell's row (or the last row). Returns true
    /// when that was the only row and the whole table went with it.
    pub fn delete_row(&self, doc: &mut Document, reference: Option<NodeId>) -> bool {
        let rows = self.rows(doc);
        if rows.len() <= 1 {
            doc.remove(self.node);
            return true;
        }
        let index = reference
            .and_then(|cell| self.coordinates(doc, cell))
            .map(|(r, _)| r)
            .unwrap_or(rows.len() - 1);
        if let Some(row) = rows.get(index) {
            doc.remove(*row);
        }
        false
    }

    /// Removes the reference cell's column (or the last column). Returns
    /// true when the table had one column and was deleted.
    pub fn delete_column(&self, doc: &mut Document, reference: Option<NodeId>) -> bool {
        let grid = self.grid(doc);
        let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
        if columns <= 1 {
            doc.remove(self.node);
            return true;
        }
        let index = reference
            .and_then(|cell| self.coordinates(doc, cell))
            .map(|(_, c)| c)
            .unwrap_or(columns - 1);
        for (row, cells) in self.rows(doc).into_iter().zip(grid) {
            let Some(cell) = cells.get(index) else {
                continue;
            };
            if cells.len() == 1 {
                doc.remove(row);
            } else {
                doc.remove(*cell);
            }
        }
        false
    }

    /// Cell after (or before) `from` in reading order.
    pub fn neighbor_cell(&self, doc: &Document, from: NodeId, backward: bool) -> Option<NodeId> {
        let cells: Vec<NodeId> = self.grid(doc).into_iter().flatten().collect();
        let index = cells.iter().position(|cell| *cell == from)?;
        if backward {
            index.checked_sub(1).and_then(|prev| cells.get(prev).copied())
        } else {
            cells.get(index + 1).copied()
        }
    }

    fn apply_width(&self, doc: &mut Document, mode: LayoutMode) {
        let width = if mode == LayoutMode::NoWrap { "100%" } else { "auto" };
        doc.set_style_property(self.node, "width", width);
    }
}

/// Builds a detached table for `spec`.
pub(crate) fn create_table(doc: &mut Document, spec: &TableSpec, config: &ObjectConfig, theme: Theme) -> NodeId {
    let table = doc.create_element_with_attrs("table", &[("data-role", ObjectKind::Table.role())]);
    common::set_layout_class(doc, table, LayoutMode::LeftAlign);
    doc.set_style_property(table, "border-collapse", "collapse");
    doc.set_style_property(table, "width", spec.width.as_css());
    common::write_margins(doc, table, &config.default_margins);
    common::write_border_data(
        doc,
        table,
        &BorderValue {
            width_px: spec.border_width,
            style: if spec.border_width == 0 {
                BorderStyle::None
            } else {
                BorderStyle::Solid
            },
            color: None,
        },
    );
    doc.set_attr(table, "data-border-sides", &BorderLines::ALL.encode());

    let body = doc.create_element("tbody");
    for r in 0..spec.rows {
        let row = doc.create_element("tr");
        let tag = if r == 0 && spec.has_header { "th" } else { "td" };
        for _ in 0..spec.cols {
            let cell = doc.create_element(tag);
            let filler = doc.create_element("br");
            doc.append_child(cell, filler);
            doc.append_child(row, cell);
        }
        doc.append_child(body, row);
    }
    doc.append_child(table, body);
    TableObject::new(table).refresh(doc, theme, config);
    table
}

impl SelectableObject for TableObject {
    fn node(&self) -> NodeId {
        self.node
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Table
    }

    fn resize_shape(&self) -> lm_overlay::HandleShape {
        lm_overlay::HandleShape::Triangle
    }

    fn activate(&self, doc: &mut Document, ctx: &ObjectContext<'_>) {
        if !doc.has_attr(self.node, "data-border-sides") {
            doc.set_attr(self.node, "data-border-sides", &BorderLines::ALL.encode());
        }
        self.refresh(doc, ctx.theme, ctx.config);
    }

    fn size(&self, doc: &Document, ctx: &ObjectContext<'_>) -> Size {
        let laid_out = ctx.layout.rect(self.node).map(|rect| rect.size());
        let read = |name: &str| doc.style_property(self.node, name).and_then(|value| parse_px(&value));
        let fallback = laid_out.unwrap_or_else(|| {
            Size::new(
                ctx.viewport.width / 2.0,
                self.rows(doc).len().max(1) as f32 * ROW_HEIGHT_ESTIMATE,
            )
        });
        Size::new(
            read("width").unwrap_or(fallback.width),
            read("height").unwrap_or(fallback.height),
        )
    }

    fn resize(
        &self,
        doc: &mut Document,
        start: Size,
        delta: Point,
        _modifiers: Modifiers,
        ctx: &ObjectContext<'_>,
    ) -> Size {
        let min = ctx.config.min_size_px;
        let size = Size::new(
            (start.width + delta.x).max(min),
            (start.height + delta.y).max(min),
        );
        doc.set_style_property(self.node, "width", &format_px(size.width));
        doc.set_style_property(self.node, "height", &format_px(size.height));
        size
    }

    fn apply_property(
        &self,
        doc: &mut Document,
        property: &ObjectProperty,
        ctx: &ObjectContext<'_>,
    ) -> EditorResult<()> {
        if apply_shared(self, doc, property, ctx)? {
            if let ObjectProperty::Layout(mode) = property {
                self.apply_width(doc, *mode);
            }
            return Ok(());
        }
        match property {
            ObjectProperty::Border(update) => {
                let current = self.border(doc, ctx.theme);
                let mut merged = common::merge_border(&current, update)?;
                if update.color.is_none() && !doc.has_attr(self.node, "data-border-color") {
                    merged.color = None;
                }
                common::write_border_data(doc, self.node, &merged);
                self.refresh(doc, ctx.theme, ctx.config);
                Ok(())
            }
            ObjectProperty::Background(color) => {
                self.set_color(doc, TableColorTarget::Table, color, None, ctx.theme, ctx.config)
            }
            other => Err(unsupported(self.kind(), other)),
        }
    }

    fn reassert(&self, doc: &mut Document, ctx: &ObjectContext<'_>) {
        self.refresh(doc, ctx.theme, ctx.config);
        common::write_decorations(doc, self.node, self.node, &ctx.config.shadow_css);
    }

    fn properties(&self, doc: &Document, ctx: &ObjectContext<'_>) -> serde_json::Value {
        let grid = self.grid(doc);
        let properties = TableProperties {
            rows: grid.len(),
            columns: grid.iter().map(Vec::len).max().unwrap_or(0),
            has_header: self.has_header(doc),
            width: doc
                .style_property(self.node, "width")
                .unwrap_or_else(|| "auto".to_owned()),
            layout: LayoutMode::of(doc, self.node),
            floating: common::is_floating(doc, self.node),
            z_index: common::z_index(doc, self.node),
            border: self.border_info(doc, ctx.theme),
            colors: self.colors(doc, None),
            shadow: common::has_shadow(doc, self.node),
            radius: common::radius(doc, self.node),
            margins: self.margins(doc, ctx.config),
        };
        serde_json::to_value(properties).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::BorderLine;
    use super::BorderLines;
    use super::ColumnPosition;
    use super::RowPosition;
    use super::TableColorTarget;
    use super::TableObject;
    use super::TableSpec;
    use super::create_table;
    use crate::config::ObjectConfig;
    use lm_core::Theme;
    use lm_dom::Document;

    fn table(doc: &mut Document, rows: usize, cols: usize, has_header: bool) -> TableObject {
        let spec = TableSpec {
            rows,
            cols,
            has_header,
            ..TableSpec::default()
        };
        let node = create_table(doc, &spec, &ObjectConfig::default(), Theme::Light);
        let root = doc.root();
        doc.clear_children(root);
        doc.append_child(root, node);
        TableObject::new(node)
    }

    fn style(doc: &Document, cell: u64, name: &str) -> String {
        doc.style_property(cell, name).unwrap_or_default()
    }

    #[test]
    fn side_presets_resolve_to_lines() {
        let lines = |tokens: &[&str]| BorderLines::from_tokens(tokens).unwrap_or(BorderLines::NONE).encode();
        assert_eq!(lines(&["all"]), "OT OB OL OR IH IV");
        assert_eq!(lines(&["none"]), "");
        assert_eq!(lines(&["outer"]), "OT OB OL OR");
        assert_eq!(lines(&["inner"]), "IH IV");
        assert_eq!(lines(&["horizontal"]), "OT OB IH");
        assert_eq!(lines(&["vertical"]), "OL OR IV");
        assert_eq!(lines(&["outer", "horizontal"]), "OT OB OL OR IH");
        assert_eq!(lines(&["outer", "inner", "horizontal"]), "OT OB OL OR IH");
        assert!(BorderLines::from_tokens(&["diagonal"]).is_err());
    }

    #[test]
    fn header_row_gets_theme_background_and_borders() {
        let mut doc = Document::new();
        let table = table(&mut doc, 3, 3, true);
        let grid = table.grid(&doc);
        assert_eq!(grid.len(), 3);
        assert!(doc.is_element(grid[0][0], "th"));
        assert!(doc.is_element(grid[1][0], "td"));
        assert_eq!(style(&doc, grid[0][1], "background-color"), "#f0f0f0");
        assert_eq!(style(&doc, grid[1][1], "background-color"), "");
        assert_eq!(style(&doc, grid[1][1], "border-top"), "1px solid #cccccc");
        assert!(table.has_header(&doc));
    }

    #[test]
    fn border_sides_only_show_selected_lines() {
        let mut doc = Document::new();
        let config = ObjectConfig::default();
        let table = table(&mut doc, 3, 3, false);
        let applied = table.set_border_sides(&mut doc, &["outer", "horizontal"], Theme::Light, &config);
        assert!(applied.is_ok_and(|lines| !lines.contains(BorderLine::InnerVertical)));
        let grid = table.grid(&doc);
        let center = grid[1][1];
        assert_eq!(style(&doc, center, "border-top"), "1px solid #cccccc");
        assert_eq!(style(&doc, center, "border-left"), "none");
        assert_eq!(style(&doc, grid[0][0], "border-left"), "1px solid #cccccc");
        assert_eq!(style(&doc, grid[0][2], "border-right"), "1px solid #cccccc");

        let replaced = table.set_border_sides(&mut doc, &["vertical"], Theme::Light, &config);
        assert!(replaced.is_ok());
        assert_eq!(style(&doc, center, "border-top"), "none");
        assert_eq!(style(&doc, center, "border-left"), "1px solid #cccccc");
    }

    #[test]
    fn colors_layer_cell_over_column_over_row() {
        let mut doc = Document::new();
        let config = ObjectConfig::default();
        let table = table(&mut doc, 2, 2, true);
        let grid = table.grid(&doc);
        let (header, body) = (grid[0][0], grid[1][0]);
        let set = |doc: &mut Document, target, color: &str, cell| {
            assert!(table.set_color(doc, target, color, cell, Theme::Light, &config).is_ok());
        };

        set(&mut doc, TableColorTarget::Table, "#ffffff", None);
        set(&mut doc, TableColorTarget::Header, "#000080", None);
        set(&mut doc, TableColorTarget::Row, "#eeeeee", Some(body));
        assert_eq!(style(&doc, header, "background-color"), "#000080");
        assert_eq!(style(&doc, body, "background-color"), "#eeeeee");

        set(&mut doc, TableColorTarget::Column, "#00ff00", Some(body));
        assert_eq!(style(&doc, header, "background-color"), "#00ff00");
        assert_eq!(style(&doc, body, "background-color"), "#00ff00");

        set(&mut doc, TableColorTarget::Cell, "#ff0000", Some(body));
        assert_eq!(style(&doc, body, "background-color"), "#ff0000");
        assert_eq!(style(&doc, grid[1][1], "background-color"), "#eeeeee");

        let colors = table.colors(&doc, Some(body));
        assert_eq!(colors.cell.as_deref(), Some("#ff0000"));
        assert_eq!(colors.row.as_deref(), Some("#eeeeee"));

        set(&mut doc, TableColorTarget::Cell, "none", Some(body));
        assert_eq!(style(&doc, body, "background-color"), "#00ff00");
        assert!(table
            .set_color(&mut doc, TableColorTarget::Row, "#111111", None, Theme::Light, &config)
            .is_err());
    }

    #[test]
    fn row_below_header_is_a_body_row() {
        let mut doc = Document::new();
        let config = ObjectConfig::default();
        let table = table(&mut doc, 1, 2, true);
        let header = table.grid(&doc)[0][0];
        let Ok(first) = table.insert_row(&mut doc, RowPosition::Below, Some(header)) else {
            unreachable!();
        };
        table.refresh(&mut doc, Theme::Light, &config);
        assert!(doc.is_element(first, "td"));
        assert_eq!(style(&doc, first, "background-color"), "");
        assert_eq!(table.grid(&doc).len(), 2);

        assert!(table.insert_column(&mut doc, ColumnPosition::Before, Some(header)).is_ok());
        let grid = table.grid(&doc);
        assert_eq!(grid[0].len(), 3);
        assert!(doc.is_element(grid[0][0], "th"));
        assert!(doc.is_element(grid[1][0], "td"));
        assert_eq!(table.coordinates(&doc, header), Some((0, 1)));
    }

    #[test]
    fn deleting_the_last_row_or_column_removes_the_table() {
        let mut doc = Document::new();
        let table = table(&mut doc, 2, 1, false);
        let first = table.grid(&doc)[0][0];
        assert!(!table.delete_row(&mut doc, Some(first)));
        assert!(!doc.contains(first));
        assert!(table.delete_column(&mut doc, None));
        assert!(!doc.contains(table.node));
    }

    #[test]
    fn tab_order_walks_rows() {
        let mut doc = Document::new();
        let table = table(&mut doc, 2, 2, false);
        let grid = table.grid(&doc);
        assert_eq!(table.neighbor_cell(&doc, grid[0][1], false), Some(grid[1][0]));
        assert_eq!(table.neighbor_cell(&doc, grid[1][0], true), Some(grid[0][1]));
        assert_eq!(table.neighbor_cell(&doc, grid[1][1], false), None);
    }

    #[test]
    fn theme_switch_recolors_defaults_only() {
        let mut doc = Document::new();
        let config = ObjectConfig::default();
        let table = table(&mut doc, 2, 2, true);
        let grid = table.grid(&doc);
        table.refresh(&mut doc, Theme::Dark, &config);
        assert_eq!(style(&doc, grid[1][1], "border-bottom"), "1px solid #555555");
        assert_eq!(style(&doc, grid[0][0], "background-color"), "#3a3a3a");
    }
}
