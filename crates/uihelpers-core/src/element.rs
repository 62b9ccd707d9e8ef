//! Element references and hierarchy snapshots.
//!
//! An [`ElementRef`] is a lazy query: it names an element by selector, type,
//! index and parent scope, and is resolved against the driver's live tree each
//! time it is used. A [`UIElement`] is one node of a tree snapshot as reported
//! by the driver.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A UI element from the accessibility hierarchy.
///
/// Elements form a tree via the `children` field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UIElement {
    /// The accessibility identifier for this element (AXUniqueId).
    #[serde(rename = "AXUniqueId", default)]
    pub identifier: Option<String>,

    /// The accessibility label (AXLabel), typically the user-visible text.
    #[serde(rename = "AXLabel", default)]
    pub label: Option<String>,

    /// The current value of the element (AXValue), e.g. text field contents.
    #[serde(rename = "AXValue", default)]
    pub value: Option<String>,

    /// The category of element.
    #[serde(rename = "type", default)]
    pub element_type: Option<ElementType>,

    /// The element's frame in screen coordinates.
    #[serde(default)]
    pub frame: Option<ElementFrame>,

    /// Child elements nested within this element.
    #[serde(default)]
    pub children: Vec<UIElement>,

    /// Whether a tap at the element's position would reach it.
    /// `None` means the backend did not report it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hittable: Option<bool>,

    /// Selection state, for cells, tabs and segmented controls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
}

impl UIElement {
    /// Returns false only when the backend explicitly reported the element
    /// as not hittable.
    pub fn is_hittable(&self) -> bool {
        self.hittable != Some(false)
    }
}

/// The frame (position and dimensions) of a UI element, in screen points
/// with the origin at the top-left corner of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementFrame {
    /// The centre point of the frame.
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

/// A screen coordinate in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this point moved by `offset`.
    pub fn offset_by(self, offset: Vector) -> Self {
        Self {
            x: self.x + offset.dx,
            y: self.y + offset.dy,
        }
    }
}

/// A displacement between two screen points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
}

/// Element categories understood by the helpers.
///
/// Hierarchies report many more types than the helpers care about. Any type
/// name not listed here deserializes as [`ElementType::Unknown`], so one
/// unfamiliar node never fails the whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Alert,
    Application,
    Button,
    Cell,
    CollectionView,
    Image,
    Key,
    Keyboard,
    Link,
    NavigationBar,
    Other,
    Picker,
    PickerWheel,
    ScrollView,
    SearchField,
    SecureTextField,
    StaticText,
    Switch,
    Table,
    TextField,
    Toolbar,
    Window,
    /// A type the helpers do not name.
    Unknown,
}

impl ElementType {
    const KNOWN: [ElementType; 22] = [
        Self::Alert,
        Self::Application,
        Self::Button,
        Self::Cell,
        Self::CollectionView,
        Self::Image,
        Self::Key,
        Self::Keyboard,
        Self::Link,
        Self::NavigationBar,
        Self::Other,
        Self::Picker,
        Self::PickerWheel,
        Self::ScrollView,
        Self::SearchField,
        Self::SecureTextField,
        Self::StaticText,
        Self::Switch,
        Self::Table,
        Self::TextField,
        Self::Toolbar,
        Self::Window,
    ];

    /// Parses a hierarchy type name. Unlisted names map to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|t| t.as_str() == name)
            .unwrap_or(Self::Unknown)
    }

    /// The name used in the accessibility hierarchy JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "Alert",
            Self::Application => "Application",
            Self::Button => "Button",
            Self::Cell => "Cell",
            Self::CollectionView => "CollectionView",
            Self::Image => "Image",
            Self::Key => "Key",
            Self::Keyboard => "Keyboard",
            Self::Link => "Link",
            Self::NavigationBar => "NavigationBar",
            Self::Other => "Other",
            Self::Picker => "Picker",
            Self::PickerWheel => "PickerWheel",
            Self::ScrollView => "ScrollView",
            Self::SearchField => "SearchField",
            Self::SecureTextField => "SecureTextField",
            Self::StaticText => "StaticText",
            Self::Switch => "Switch",
            Self::Table => "Table",
            Self::TextField => "TextField",
            Self::Toolbar => "Toolbar",
            Self::Window => "Window",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<String> for ElementType {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<ElementType> for String {
    fn from(element_type: ElementType) -> Self {
        element_type.as_str().to_string()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an [`ElementRef`] matches candidate elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Match the accessibility identifier. Supports `*` and `?` wildcards.
    Identifier(String),
    /// Match the accessibility label. Supports `*` and `?` wildcards.
    Label(String),
    /// Match either the identifier or the label, like a query subscript.
    Named(String),
    /// Like `Named`, but compared literally: `*` and `?` are plain characters.
    Exact(String),
    /// Match any element (usually narrowed by type and index).
    Any,
}

/// A lazily resolved reference to an element in the driver's hierarchy.
///
/// Resolution picks the `index`-th match, in depth-first order, among the
/// elements that satisfy the selector and type filter; without an index it
/// picks the first. When `scope` is set, only descendants of the scope are
/// candidates. A scope with an index covers that one element, a scope
/// without one covers every element it matches, so
/// `any(Cell).nth(3).within(&any(CollectionView))` counts cells across all
/// collection views.
///
/// ```
/// use uihelpers_core::element::{ElementRef, ElementType};
///
/// let list = ElementRef::identifier("photos").of_type(ElementType::CollectionView);
/// let third_cell = ElementRef::any(ElementType::Cell).nth(2).within(&list);
/// assert_eq!(third_cell.to_string(), "Cell[2] in CollectionView 'photos'");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRef {
    pub selector: Selector,
    pub element_type: Option<ElementType>,
    pub index: Option<usize>,
    pub scope: Option<Box<ElementRef>>,
}

impl ElementRef {
    /// Reference by accessibility identifier.
    pub fn identifier(identifier: impl Into<String>) -> Self {
        Self::with_selector(Selector::Identifier(identifier.into()))
    }

    /// Reference by accessibility label.
    pub fn label(label: impl Into<String>) -> Self {
        Self::with_selector(Selector::Label(label.into()))
    }

    /// Reference by identifier or label, whichever matches.
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_selector(Selector::Named(name.into()))
    }

    /// Reference by identifier or label compared literally, for names that
    /// contain `*` or `?`.
    pub fn exact(name: impl Into<String>) -> Self {
        Self::with_selector(Selector::Exact(name.into()))
    }

    /// Reference to any element of the given type.
    pub fn any(element_type: ElementType) -> Self {
        Self::with_selector(Selector::Any).of_type(element_type)
    }

    fn with_selector(selector: Selector) -> Self {
        Self {
            selector,
            element_type: None,
            index: None,
            scope: None,
        }
    }

    /// Restrict matches to one element type.
    pub fn of_type(mut self, element_type: ElementType) -> Self {
        self.element_type = Some(element_type);
        self
    }

    /// Pick the `index`-th match (zero based) instead of the first.
    pub fn nth(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Only match descendants of `parent`.
    pub fn within(mut self, parent: &ElementRef) -> Self {
        self.scope = Some(Box::new(parent.clone()));
        self
    }

    /// Returns true if `element` satisfies this reference's selector and type
    /// filter. Index and scope are not considered.
    pub fn matches(&self, element: &UIElement) -> bool {
        let type_matches = match self.element_type {
            Some(typ) => element.element_type == Some(typ),
            None => true,
        };
        if !type_matches {
            return false;
        }
        match &self.selector {
            Selector::Identifier(pattern) => element
                .identifier
                .as_deref()
                .is_some_and(|id| glob_match(pattern, id)),
            Selector::Label(pattern) => element
                .label
                .as_deref()
                .is_some_and(|label| glob_match(pattern, label)),
            Selector::Named(pattern) => [&element.identifier, &element.label]
                .into_iter()
                .flatten()
                .any(|name| glob_match(pattern, name)),
            Selector::Exact(name) => [&element.identifier, &element.label]
                .into_iter()
                .flatten()
                .any(|candidate| candidate == name),
            Selector::Any => true,
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let typ = self.element_type.map_or("Element", |t| t.as_str());
        match &self.selector {
            Selector::Identifier(id) => write!(f, "{} '{}'", typ, id)?,
            Selector::Label(label) => write!(f, "{} labelled '{}'", typ, label)?,
            Selector::Named(name) | Selector::Exact(name) => write!(f, "{} named '{}'", typ, name)?,
            Selector::Any => write!(f, "{}", typ)?,
        }
        if let Some(index) = self.index {
            write!(f, "[{}]", index)?;
        }
        if let Some(scope) = &self.scope {
            write!(f, " in {}", scope)?;
        }
        Ok(())
    }
}

/// Matches `text` against a glob pattern with `*` (any run) and `?` (one char).
/// Without wildcards this is plain equality.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains(['*', '?']) {
        return pattern == text;
    }

    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen, and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pat[p..].iter().all(|&c| c == '*')
}

/// Resolves `target` against a hierarchy snapshot.
///
/// This is the local search the default [`AutomationDriver`] methods use.
///
/// [`AutomationDriver`]: crate::driver::AutomationDriver
pub fn resolve_in(tree: &[UIElement], target: &ElementRef) -> Option<UIElement> {
    resolve_ref(tree, target).cloned()
}

fn resolve_ref<'a>(tree: &'a [UIElement], target: &ElementRef) -> Option<&'a UIElement> {
    let mut remaining = target.index.unwrap_or(0);
    search_roots(tree, target.scope.as_deref())
        .into_iter()
        .find_map(|root| find_match(root, target, &mut remaining))
}

/// The sibling lists to search for a reference with the given scope.
fn search_roots<'a>(tree: &'a [UIElement], scope: Option<&ElementRef>) -> Vec<&'a [UIElement]> {
    let Some(scope) = scope else {
        return vec![tree];
    };
    let parents: Vec<&UIElement> = match scope.index {
        Some(_) => resolve_ref(tree, scope).into_iter().collect(),
        None => {
            let mut found = Vec::new();
            for root in search_roots(tree, scope.scope.as_deref()) {
                collect_outermost(root, scope, &mut found);
            }
            found
        }
    };
    parents.into_iter().map(|parent| parent.children.as_slice()).collect()
}

/// Collects matches of `target`, not descending into a match. Nested matches
/// are still searched as part of their outermost ancestor.
fn collect_outermost<'a>(elements: &'a [UIElement], target: &ElementRef, found: &mut Vec<&'a UIElement>) {
    for element in elements {
        if target.matches(element) {
            found.push(element);
        } else {
            collect_outermost(&element.children, target, found);
        }
    }
}

fn find_match<'a>(
    elements: &'a [UIElement],
    target: &ElementRef,
    remaining: &mut usize,
) -> Option<&'a UIElement> {
    for element in elements {
        if target.matches(element) {
            if *remaining == 0 {
                return Some(element);
            }
            *remaining -= 1;
        }
        if let Some(found) = find_match(&element.children, target, remaining) {
            return Some(found);
        }
    }
    None
}
