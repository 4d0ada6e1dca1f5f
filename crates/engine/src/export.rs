//! City-block document export.
//!
//! ```text
//! <cb_x_y date=".." citizen="true" emailaddress=".." owner=".." startz="1"
//!         starty="0" startx="0" desc=".." title="..">
//!   <r_{y}><c_{x} b_{z}="{id}" .. /> ..</r_{y}> ..
//! </cb_x_y>
//! ```
//!
//! Sparse: rows, columns and layers without blocks are left out. Title and
//! description are percent-encoded.

use std::fmt::{self, Write as _};

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::grid::GridModel;
use crate::grid::block::BlockId;
use crate::grid::position::{ColumnPos, GRID_HALF};

pub const ROOT_ELEMENT: &str = "cb_x_y";
pub const DEFAULT_TITLE: &str = "A City Block";
pub const DEFAULT_DESCRIPTION: &str = "A nondescript city block, in a middle-class neighborhood.";

/// Authoring metadata written on the root element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// `YYYY.MM.DD`
    pub date: String,
    pub citizen: bool,
    pub email: String,
    pub owner: String,
    pub title: String,
    pub description: String,
}

impl Default for ExportMetadata {
    fn default() -> Self {
        Self {
            date: String::new(),
            citizen: true,
            email: "builder@zanpo.com".to_string(),
            owner: "player".to_string(),
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRecord {
    pub x: i32,
    /// Occupied layers bottom-up.
    pub layers: Vec<(i32, BlockId)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRecord {
    pub y: i32,
    pub columns: Vec<ColumnRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityBlockDocument {
    pub attributes: IndexMap<&'static str, String>,
    pub rows: Vec<RowRecord>,
}

/// Flatten `grid` into a document, rows by ascending y, columns by
/// ascending x.
pub fn export(grid: &GridModel, meta: &ExportMetadata) -> CityBlockDocument {
    let mut attributes = IndexMap::new();
    attributes.insert("date", meta.date.clone());
    attributes.insert("citizen", meta.citizen.to_string());
    attributes.insert("emailaddress", meta.email.clone());
    attributes.insert("owner", meta.owner.clone());
    attributes.insert("startz", "1".to_string());
    attributes.insert("starty", "0".to_string());
    attributes.insert("startx", "0".to_string());
    attributes.insert("desc", encode_uri_component(&meta.description));
    attributes.insert("title", encode_uri_component(&meta.title));

    let rows = (-GRID_HALF..=GRID_HALF)
        .filter_map(|y| {
            let columns: Vec<ColumnRecord> = (-GRID_HALF..=GRID_HALF)
                .filter_map(|x| {
                    let layers: Vec<_> = grid.column_blocks(ColumnPos::new(x, y)).collect();
                    (!layers.is_empty()).then_some(ColumnRecord { x, layers })
                })
                .collect();
            (!columns.is_empty()).then_some(RowRecord { y, columns })
        })
        .collect();

    CityBlockDocument { attributes, rows }
}

impl CityBlockDocument {
    pub fn block_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| &r.columns)
            .map(|c| c.layers.len())
            .sum()
    }

    pub fn to_xml(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CityBlockDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{ROOT_ELEMENT}")?;
        for (name, value) in &self.attributes {
            write!(f, " {name}=\"{}\"", escape_attr(value))?;
        }
        f.write_char('>')?;
        for row in &self.rows {
            write!(f, "<r_{}>", row.y)?;
            for column in &row.columns {
                write!(f, "<c_{}", column.x)?;
                for (z, block) in &column.layers {
                    write!(f, " b_{z}=\"{block}\"")?;
                }
                f.write_str(" />")?;
            }
            write!(f, "</r_{}>", row.y)?;
        }
        write!(f, "</{ROOT_ELEMENT}>")
    }
}

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode byte-wise over UTF-8, as browsers' `encodeURIComponent`.
pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
