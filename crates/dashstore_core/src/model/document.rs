//! Dashboard / Row / Panel document tree.
//!
//! # Responsibility
//! - Parse JSON sources into an owned tree of dashboards, rows and panels.
//! - Resolve children by name and expose weak parent back-references.
//! - Merge incoming documents in place (`update`) and drop children
//!   (`remove_child`), regenerating canonical bytes on demand.
//!
//! # Invariants
//! - Depth is at most Dashboard -> Row -> Panel; panels never have children.
//! - Children are owned top-down through `Rc`; `parent` links are `Weak` and
//!   only used for lookup.
//! - Within one file tree, row positions and panel ids are unique among siblings.
//! - `update` never changes the receiver's name or parent.

use crate::model::naming::{numbered_name, resolve_index, slug};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::{Rc, Weak};

const ROWS_KEY: &str = "rows";
const PANELS_KEY: &str = "panels";
const TITLE_KEY: &str = "title";
const ID_KEY: &str = "id";

type Shared<T> = Rc<RefCell<T>>;
type Content = Map<String, Value>;

/// Variant of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Top-level node holding rows.
    Dashboard,
    /// Middle node holding panels.
    Row,
    /// Terminal node.
    Panel,
}

impl DocumentKind {
    /// Human-readable variant label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Row => "Row",
            Self::Panel => "Panel",
        }
    }

    /// Lowercase variant name, as accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Row => "row",
            Self::Panel => "panel",
        }
    }

    /// Parses a lowercase variant name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Some(Self::Dashboard),
            "row" => Some(Self::Row),
            "panel" => Some(Self::Panel),
            _ => None,
        }
    }

    fn child_kind(self) -> Option<Self> {
        match self {
            Self::Dashboard => Some(Self::Row),
            Self::Row => Some(Self::Panel),
            Self::Panel => None,
        }
    }
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors raised by document parsing and tree mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Source bytes do not describe a document of the expected shape.
    Malformed { kind: DocumentKind, message: String },
    /// Named child is absent from its container.
    ChildNotFound { kind: DocumentKind, name: String },
    /// `update` received a document it cannot absorb.
    IncompatibleUpdate {
        target: DocumentKind,
        incoming: DocumentKind,
    },
    /// Children were requested from a panel.
    NoSubNodes,
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { kind, message } => write!(f, "malformed {kind} source: {message}"),
            Self::ChildNotFound { kind, name } => {
                write!(f, "There is no {}: {name}", kind.as_str())
            }
            Self::IncompatibleUpdate { target, incoming } => {
                write!(f, "Can not update {target} with {incoming}")
            }
            Self::NoSubNodes => write!(f, "Panel contains no sub-nodes"),
        }
    }
}

impl Error for DocumentError {}

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Debug)]
struct Dashboard {
    name: String,
    content: Content,
    rows: Vec<Shared<Row>>,
}

#[derive(Debug)]
struct Row {
    name: String,
    position: u64,
    content: Content,
    panels: Vec<Shared<Panel>>,
    parent: Weak<RefCell<Dashboard>>,
}

#[derive(Debug)]
struct Panel {
    name: String,
    content: Content,
    parent: Weak<RefCell<Row>>,
}

impl Dashboard {
    fn to_value(&self) -> Value {
        let mut map = self.content.clone();
        let rows = self.rows.iter().map(|row| row.borrow().to_value()).collect();
        map.insert(ROWS_KEY.to_string(), Value::Array(rows));
        Value::Object(map)
    }

    fn max_panel_id(&self) -> u64 {
        self.rows
            .iter()
            .map(|row| row.borrow().max_panel_id())
            .max()
            .unwrap_or(0)
    }

    fn row_index(&self, name: &str) -> Option<usize> {
        let keys: Vec<(String, u64)> = self
            .rows
            .iter()
            .map(|row| {
                let row = row.borrow();
                (row.name.clone(), row.position)
            })
            .collect();
        resolve_index(name, &keys)
    }
}

impl Row {
    fn to_value(&self) -> Value {
        let mut map = self.content.clone();
        let panels = self
            .panels
            .iter()
            .map(|panel| Value::Object(panel.borrow().content.clone()))
            .collect();
        map.insert(PANELS_KEY.to_string(), Value::Array(panels));
        Value::Object(map)
    }

    fn max_panel_id(&self) -> u64 {
        self.panels
            .iter()
            .map(|panel| panel.borrow().id())
            .max()
            .unwrap_or(0)
    }

    fn panel_index(&self, name: &str) -> Option<usize> {
        let keys: Vec<(String, u64)> = self
            .panels
            .iter()
            .map(|panel| {
                let panel = panel.borrow();
                (panel.name.clone(), panel.id())
            })
            .collect();
        resolve_index(name, &keys)
    }

    fn renumber(&mut self, position: u64) {
        self.position = position;
        self.name = numbered_name(position, title_of(&self.content));
    }
}

impl Panel {
    fn id(&self) -> u64 {
        self.content.get(ID_KEY).and_then(Value::as_u64).unwrap_or(0)
    }

    fn assign_id(&mut self, id: u64) {
        self.content.insert(ID_KEY.to_string(), Value::from(id));
        self.name = numbered_name(id, title_of(&self.content));
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dashboard(Shared<Dashboard>),
    Row(Shared<Row>),
    Panel(Shared<Panel>),
}

/// Handle to one node of a parsed document tree.
///
/// Cloning is cheap and yields another handle to the same node. A handle to an
/// inner row or panel also keeps its file root alive, so `parent()` can be
/// followed up to the stored document for as long as the handle exists.
#[derive(Debug, Clone)]
pub struct Document {
    node: Node,
    root: Node,
}

impl Document {
    /// Parses `source` as a document of `kind`.
    ///
    /// `name_hint` becomes the document name (normally its file name). Without
    /// a hint the name is derived from the title, plus position/id for rows
    /// and panels.
    ///
    /// # Errors
    /// - `DocumentError::Malformed` when `source` is not a JSON object of the
    ///   expected shape.
    pub fn parse(
        kind: DocumentKind,
        source: &[u8],
        name_hint: Option<&str>,
    ) -> DocumentResult<Self> {
        let value: Value = serde_json::from_slice(source).map_err(|err| {
            DocumentError::Malformed {
                kind,
                message: err.to_string(),
            }
        })?;
        Self::from_value(kind, value, name_hint)
    }

    /// Builds a document of `kind` from an already-decoded JSON value.
    pub fn from_value(
        kind: DocumentKind,
        value: Value,
        name_hint: Option<&str>,
    ) -> DocumentResult<Self> {
        let content = into_object(kind, value)?;
        let hint = name_hint.map(str::to_string);
        let node = match kind {
            DocumentKind::Dashboard => Node::Dashboard(build_dashboard(content, hint)?),
            DocumentKind::Row => Node::Row(build_row(content, 1, hint, Weak::new())?),
            DocumentKind::Panel => Node::Panel(build_panel(content, hint, Weak::new())),
        };
        Ok(Self {
            root: node.clone(),
            node,
        })
    }

    pub fn kind(&self) -> DocumentKind {
        match &self.node {
            Node::Dashboard(_) => DocumentKind::Dashboard,
            Node::Row(_) => DocumentKind::Row,
            Node::Panel(_) => DocumentKind::Panel,
        }
    }

    /// Identity of this node within its directory or parent.
    pub fn name(&self) -> String {
        match &self.node {
            Node::Dashboard(dashboard) => dashboard.borrow().name.clone(),
            Node::Row(row) => row.borrow().name.clone(),
            Node::Panel(panel) => panel.borrow().name.clone(),
        }
    }

    /// Immediately enclosing node, or `None` for a file root.
    pub fn parent(&self) -> Option<Self> {
        let parent = match &self.node {
            Node::Dashboard(_) => None,
            Node::Row(row) => row.borrow().parent.upgrade().map(Node::Dashboard),
            Node::Panel(panel) => panel.borrow().parent.upgrade().map(Node::Row),
        }?;
        Some(self.with_node(parent))
    }

    /// Topmost ancestor: the document physically stored as a file.
    pub fn top(&self) -> Self {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Current in-memory state as JSON, children included.
    pub fn to_value(&self) -> Value {
        match &self.node {
            Node::Dashboard(dashboard) => dashboard.borrow().to_value(),
            Node::Row(row) => row.borrow().to_value(),
            Node::Panel(panel) => Value::Object(panel.borrow().content.clone()),
        }
    }

    /// Canonical serialized bytes of the current in-memory state.
    pub fn source(&self) -> DocumentResult<Vec<u8>> {
        serde_json::to_vec_pretty(&self.to_value()).map_err(|err| DocumentError::Malformed {
            kind: self.kind(),
            message: err.to_string(),
        })
    }

    /// Names of the immediate children, in stored order.
    ///
    /// # Errors
    /// - `DocumentError::NoSubNodes` for panels.
    pub fn child_names(&self) -> DocumentResult<Vec<String>> {
        match &self.node {
            Node::Dashboard(dashboard) => Ok(dashboard
                .borrow()
                .rows
                .iter()
                .map(|row| row.borrow().name.clone())
                .collect()),
            Node::Row(row) => Ok(row
                .borrow()
                .panels
                .iter()
                .map(|panel| panel.borrow().name.clone())
                .collect()),
            Node::Panel(_) => Err(DocumentError::NoSubNodes),
        }
    }

    /// Resolves a child row (of a dashboard) or panel (of a row) by name.
    pub fn child(&self, name: &str) -> DocumentResult<Self> {
        let child = match &self.node {
            Node::Dashboard(dashboard) => find_row(&dashboard.borrow(), name).map(Node::Row),
            Node::Row(row) => find_panel(&row.borrow(), name).map(Node::Panel),
            Node::Panel(_) => return Err(DocumentError::NoSubNodes),
        };
        match child {
            Some(node) => Ok(self.with_node(node)),
            None => Err(self.child_not_found(name)),
        }
    }

    /// Merges `other` into this node in place.
    ///
    /// Same-variant documents are shallow-merged key by key (incoming wins,
    /// children replaced when the incoming document has any). A row merged
    /// into a dashboard, or a panel into a row, is appended as a new child.
    ///
    /// # Errors
    /// - `DocumentError::IncompatibleUpdate` for any other pairing.
    pub fn update(&self, other: &Self) -> DocumentResult<()> {
        let incoming_kind = other.kind();
        let incoming = into_object(incoming_kind, other.to_value())?;
        match (&self.node, incoming_kind) {
            (Node::Dashboard(dashboard), DocumentKind::Dashboard) => {
                merge_dashboard(dashboard, incoming)
            }
            (Node::Dashboard(dashboard), DocumentKind::Row) => append_row(dashboard, incoming),
            (Node::Row(row), DocumentKind::Row) => merge_row(row, incoming),
            (Node::Row(row), DocumentKind::Panel) => {
                append_panel(row, incoming);
                Ok(())
            }
            (Node::Panel(panel), DocumentKind::Panel) => {
                let mut panel = panel.borrow_mut();
                for (key, value) in incoming {
                    if key != ID_KEY {
                        panel.content.insert(key, value);
                    }
                }
                Ok(())
            }
            _ => Err(DocumentError::IncompatibleUpdate {
                target: self.kind(),
                incoming: incoming_kind,
            }),
        }
    }

    /// Removes the named child row or panel.
    ///
    /// Remaining dashboard rows are renumbered so positions stay contiguous.
    pub fn remove_child(&self, name: &str) -> DocumentResult<()> {
        match &self.node {
            Node::Dashboard(dashboard) => {
                let mut dashboard = dashboard.borrow_mut();
                let Some(index) = dashboard.row_index(name) else {
                    return Err(self.child_not_found(name));
                };
                dashboard.rows.remove(index);
                for (offset, row) in dashboard.rows.iter().enumerate().skip(index) {
                    row.borrow_mut().renumber(offset as u64 + 1);
                }
                Ok(())
            }
            Node::Row(row) => {
                let mut row = row.borrow_mut();
                match row.panel_index(name) {
                    Some(index) => {
                        row.panels.remove(index);
                        Ok(())
                    }
                    None => Err(self.child_not_found(name)),
                }
            }
            Node::Panel(_) => Err(DocumentError::NoSubNodes),
        }
    }

    fn with_node(&self, node: Node) -> Self {
        Self {
            node,
            root: self.root.clone(),
        }
    }

    fn child_not_found(&self, name: &str) -> DocumentError {
        match self.kind().child_kind() {
            Some(kind) => DocumentError::ChildNotFound {
                kind,
                name: name.to_string(),
            },
            None => DocumentError::NoSubNodes,
        }
    }
}

fn into_object(kind: DocumentKind, value: Value) -> DocumentResult<Content> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DocumentError::Malformed {
            kind,
            message: format!("expected a JSON object, got {}", json_type(&other)),
        }),
    }
}

fn take_children(
    content: &mut Content,
    key: &str,
    kind: DocumentKind,
) -> DocumentResult<Vec<Content>> {
    match content.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(DocumentError::Malformed {
                    kind,
                    message: format!(
                        "`{key}` entries must be objects, got {}",
                        json_type(&other)
                    ),
                }),
            })
            .collect(),
        Some(other) => Err(DocumentError::Malformed {
            kind,
            message: format!("`{key}` must be an array, got {}", json_type(&other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn title_of(content: &Content) -> &str {
    content.get(TITLE_KEY).and_then(Value::as_str).unwrap_or("")
}

fn build_dashboard(
    mut content: Content,
    name_hint: Option<String>,
) -> DocumentResult<Shared<Dashboard>> {
    let rows = take_children(&mut content, ROWS_KEY, DocumentKind::Dashboard)?;
    let name = name_hint.unwrap_or_else(|| slug(title_of(&content)));
    let dashboard = Rc::new(RefCell::new(Dashboard {
        name,
        content,
        rows: Vec::new(),
    }));
    let built = build_rows(&dashboard, rows)?;
    dashboard.borrow_mut().rows = built;
    Ok(dashboard)
}

fn build_rows(
    dashboard: &Shared<Dashboard>,
    rows: Vec<Content>,
) -> DocumentResult<Vec<Shared<Row>>> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| build_row(row, index as u64 + 1, None, Rc::downgrade(dashboard)))
        .collect()
}

fn build_row(
    mut content: Content,
    position: u64,
    name_hint: Option<String>,
    parent: Weak<RefCell<Dashboard>>,
) -> DocumentResult<Shared<Row>> {
    let panels = take_children(&mut content, PANELS_KEY, DocumentKind::Row)?;
    let name = name_hint.unwrap_or_else(|| numbered_name(position, title_of(&content)));
    let row = Rc::new(RefCell::new(Row {
        name,
        position,
        content,
        panels: Vec::new(),
        parent,
    }));
    let built = panels
        .into_iter()
        .map(|panel| build_panel(panel, None, Rc::downgrade(&row)))
        .collect();
    row.borrow_mut().panels = built;
    Ok(row)
}

fn build_panel(
    content: Content,
    name_hint: Option<String>,
    parent: Weak<RefCell<Row>>,
) -> Shared<Panel> {
    let id = content.get(ID_KEY).and_then(Value::as_u64).unwrap_or(0);
    let name = name_hint.unwrap_or_else(|| numbered_name(id, title_of(&content)));
    Rc::new(RefCell::new(Panel {
        name,
        content,
        parent,
    }))
}

fn find_row(dashboard: &Dashboard, name: &str) -> Option<Shared<Row>> {
    let index = dashboard.row_index(name)?;
    Some(Rc::clone(&dashboard.rows[index]))
}

fn find_panel(row: &Row, name: &str) -> Option<Shared<Panel>> {
    let index = row.panel_index(name)?;
    Some(Rc::clone(&row.panels[index]))
}

/// Highest panel id among the rows of `row`'s file tree other than `row` itself.
fn max_panel_id_elsewhere(row: &Shared<Row>) -> u64 {
    let Some(dashboard) = row.borrow().parent.upgrade() else {
        return 0;
    };
    let dashboard = dashboard.borrow();
    dashboard
        .rows
        .iter()
        .filter(|sibling| !Rc::ptr_eq(sibling, row))
        .map(|sibling| sibling.borrow().max_panel_id())
        .max()
        .unwrap_or(0)
}

fn merge_dashboard(dashboard: &Shared<Dashboard>, mut incoming: Content) -> DocumentResult<()> {
    let rows = take_children(&mut incoming, ROWS_KEY, DocumentKind::Dashboard)?;
    let replacement = if rows.is_empty() {
        None
    } else {
        Some(build_rows(dashboard, rows)?)
    };

    let mut dashboard = dashboard.borrow_mut();
    dashboard.content.extend(incoming);
    if let Some(rows) = replacement {
        dashboard.rows = rows;
    }
    Ok(())
}

fn append_row(dashboard: &Shared<Dashboard>, incoming: Content) -> DocumentResult<()> {
    let (position, first_id) = {
        let current = dashboard.borrow();
        (current.rows.len() as u64 + 1, current.max_panel_id() + 1)
    };
    let row = build_row(incoming, position, None, Rc::downgrade(dashboard))?;
    for (offset, panel) in row.borrow().panels.iter().enumerate() {
        panel.borrow_mut().assign_id(first_id + offset as u64);
    }
    dashboard.borrow_mut().rows.push(row);
    Ok(())
}

fn merge_row(row: &Shared<Row>, mut incoming: Content) -> DocumentResult<()> {
    let panels = take_children(&mut incoming, PANELS_KEY, DocumentKind::Row)?;
    let nested = row.borrow().parent.upgrade().is_some();
    let first_id = max_panel_id_elsewhere(row) + 1;

    let replacement: Vec<Shared<Panel>> = panels
        .into_iter()
        .map(|panel| build_panel(panel, None, Rc::downgrade(row)))
        .collect();
    if nested {
        for (offset, panel) in replacement.iter().enumerate() {
            panel.borrow_mut().assign_id(first_id + offset as u64);
        }
    }

    let mut current = row.borrow_mut();
    current.content.extend(incoming);
    if !replacement.is_empty() {
        current.panels = replacement;
    }
    Ok(())
}

fn append_panel(row: &Shared<Row>, incoming: Content) {
    let id = max_panel_id_elsewhere(row).max(row.borrow().max_panel_id()) + 1;
    let panel = build_panel(incoming, None, Rc::downgrade(row));
    panel.borrow_mut().assign_id(id);
    row.borrow_mut().panels.push(panel);
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentError, DocumentKind};
    use serde_json::json;

    fn dashboard() -> Document {
        Document::from_value(
            DocumentKind::Dashboard,
            json!({
                "title": "Hosts",
                "rows": [
                    {"title": "CPU", "panels": [{"id": 1, "title": "Load"}, {"id": 2, "title": "Steal"}]},
                    {"title": "Disk", "panels": [{"id": 3, "title": "IOPS"}]}
                ]
            }),
            Some("hosts"),
        )
        .unwrap()
    }

    #[test]
    fn kind_parse_accepts_known_names() {
        assert_eq!(DocumentKind::parse(" Row "), Some(DocumentKind::Row));
        assert_eq!(DocumentKind::parse("folder"), None);
    }

    #[test]
    fn inner_handle_keeps_parent_chain_alive() {
        let panel = dashboard().child("1-cpu").unwrap().child("2").unwrap();

        let row = panel.parent().unwrap();
        assert_eq!(row.name(), "1-cpu");
        let top = panel.top();
        assert_eq!(top.kind(), DocumentKind::Dashboard);
        assert_eq!(top.name(), "hosts");
        assert!(top.parent().is_none());
    }

    #[test]
    fn removing_first_row_renumbers_remaining_rows() {
        let document = dashboard();
        document.remove_child("1-cpu").unwrap();

        assert_eq!(document.child_names().unwrap(), vec!["1-disk".to_string()]);
        assert_eq!(
            document.remove_child("9-missing").unwrap_err(),
            DocumentError::ChildNotFound {
                kind: DocumentKind::Row,
                name: "9-missing".to_string()
            }
        );
    }

    #[test]
    fn panel_update_keeps_its_id() {
        let panel = dashboard().child("2-disk").unwrap().child("3-iops").unwrap();
        let incoming = Document::from_value(
            DocumentKind::Panel,
            json!({"id": 42, "title": "IOPS", "span": 6}),
            None,
        )
        .unwrap();

        panel.update(&incoming).unwrap();

        assert_eq!(panel.to_value()["id"], json!(3));
        assert_eq!(panel.to_value()["span"], json!(6));
        assert_eq!(panel.name(), "3-iops");
    }
}
