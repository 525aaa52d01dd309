//! A recording in-memory [`Environment`] shared by the integration tests.

#![allow(dead_code)]

use malevich_dom::{Environment, Listener};
use std::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	rc::{Rc, Weak},
};

pub fn init_logging() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
}

struct NodeData {
	id: usize,
	/// [`None`] for text nodes.
	tag: Option<String>,
	namespace: Option<&'static str>,
	text: RefCell<String>,
	attributes: RefCell<Vec<(String, String)>>,
	listeners: RefCell<Vec<(String, Listener<MockEvent>)>>,
	children: RefCell<Vec<MockNode>>,
	parent: RefCell<Weak<NodeData>>,
}

/// A live node. Equality is identity.
#[derive(Clone)]
pub struct MockNode(Rc<NodeData>);
impl PartialEq for MockNode {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Debug for MockNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.0.tag {
			Some(tag) => write!(f, "#{}<{}>", self.0.id, tag),
			None => write!(f, "#{}{:?}", self.0.id, self.0.text.borrow()),
		}
	}
}
impl MockNode {
	fn new(id: usize, tag: Option<String>, namespace: Option<&'static str>, text: String) -> Self {
		Self(Rc::new(NodeData {
			id,
			tag,
			namespace,
			text: RefCell::new(text),
			attributes: RefCell::default(),
			listeners: RefCell::default(),
			children: RefCell::default(),
			parent: RefCell::default(),
		}))
	}

	pub fn id(&self) -> usize {
		self.0.id
	}

	pub fn tag(&self) -> Option<String> {
		self.0.tag.clone()
	}

	pub fn namespace(&self) -> Option<&'static str> {
		self.0.namespace
	}

	pub fn children(&self) -> Vec<MockNode> {
		self.0.children.borrow().clone()
	}

	pub fn parent(&self) -> Option<MockNode> {
		self.0.parent.borrow().upgrade().map(MockNode)
	}

	pub fn attribute(&self, name: &str) -> Option<String> {
		self.0.attributes.borrow().iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
	}

	pub fn listener_count(&self) -> usize {
		self.0.listeners.borrow().len()
	}

	/// Appends a child directly, bypassing the environment's bookkeeping.
	pub fn append_unmanaged(&self, child: &MockNode) {
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
		self.0.children.borrow_mut().push(child.clone());
	}

	/// Calls the listeners bound for `event`, in binding order.
	pub fn dispatch(&self, event: &'static str) {
		let listeners: Vec<_> = self.0.listeners.borrow().iter().filter(|(name, _)| name == event).map(|(_, listener)| listener.clone()).collect();
		for listener in listeners {
			listener(&MockEvent(event));
		}
	}

	/// Markup of this node, with attributes in assignment order.
	pub fn to_html(&self) -> String {
		match &self.0.tag {
			Some(tag) => {
				let mut html = format!("<{}", tag);
				for (name, value) in self.0.attributes.borrow().iter() {
					if value.is_empty() {
						html += &format!(" {}", name);
					} else {
						html += &format!(" {}=\"{}\"", name, value);
					}
				}
				html += ">";
				html += &self.inner_html();
				html + &format!("</{}>", tag)
			}
			None => self.0.text.borrow().clone(),
		}
	}

	pub fn inner_html(&self) -> String {
		self.0.children.borrow().iter().map(MockNode::to_html).collect()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockEvent(pub &'static str);

/// Operation counts since the last [`MockEnv::reset_counts`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
	pub creates: usize,
	pub inserts: usize,
	pub removes: usize,
	pub text_sets: usize,
	pub attribute_sets: usize,
	pub attribute_removes: usize,
	pub listener_adds: usize,
	pub listener_removes: usize,
}

#[derive(Default)]
pub struct MockEnv {
	next_id: Cell<usize>,
	counts: Cell<Counts>,
}
impl MockEnv {
	/// A detached `<body>` to render into. Not counted.
	pub fn root(&self) -> MockNode {
		self.node(Some("body".to_string()), None, String::new())
	}

	pub fn counts(&self) -> Counts {
		self.counts.get()
	}

	pub fn reset_counts(&self) {
		self.counts.set(Counts::default());
	}

	fn count(&self, f: impl FnOnce(&mut Counts)) {
		let mut counts = self.counts.get();
		f(&mut counts);
		self.counts.set(counts);
	}

	fn node(&self, tag: Option<String>, namespace: Option<&'static str>, text: String) -> MockNode {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		MockNode::new(id, tag, namespace, text)
	}
}

impl Environment for MockEnv {
	type Resource = MockNode;
	type Event = MockEvent;

	fn create_element(&self, tag: &str, namespace: Option<&'static str>) -> MockNode {
		self.count(|c| c.creates += 1);
		self.node(Some(tag.to_string()), namespace, String::new())
	}

	fn create_text(&self, text: &str) -> MockNode {
		self.count(|c| c.creates += 1);
		self.node(None, None, text.to_string())
	}

	fn set_text(&self, resource: &MockNode, text: &str) {
		assert!(resource.0.tag.is_none(), "Set text of element {:?}", resource);
		self.count(|c| c.text_sets += 1);
		*resource.0.text.borrow_mut() = text.to_string();
	}

	fn set_attribute(&self, resource: &MockNode, name: &str, value: &str) {
		self.count(|c| c.attribute_sets += 1);
		let mut attributes = resource.0.attributes.borrow_mut();
		match attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, v)) => *v = value.to_string(),
			None => attributes.push((name.to_string(), value.to_string())),
		}
	}

	fn remove_attribute(&self, resource: &MockNode, name: &str) {
		self.count(|c| c.attribute_removes += 1);
		resource.0.attributes.borrow_mut().retain(|(n, _)| n != name);
	}

	fn add_event_listener(&self, resource: &MockNode, event: &str, listener: &Listener<MockEvent>) {
		self.count(|c| c.listener_adds += 1);
		resource.0.listeners.borrow_mut().push((event.to_string(), listener.clone()));
	}

	fn remove_event_listener(&self, resource: &MockNode, event: &str, listener: &Listener<MockEvent>) {
		self.count(|c| c.listener_removes += 1);
		let mut listeners = resource.0.listeners.borrow_mut();
		let index = listeners
			.iter()
			.position(|(name, bound)| name == event && Rc::ptr_eq(bound, listener))
			.unwrap_or_else(|| panic!("Removed unbound {:?} listener from {:?}", event, resource));
		listeners.remove(index);
	}

	fn insert(&self, parent: &MockNode, child: &MockNode, after: Option<&MockNode>) {
		assert!(parent.0.tag.is_some(), "Inserted into text node {:?}", parent);
		self.count(|c| c.inserts += 1);
		if let Some(previous) = child.parent() {
			previous.0.children.borrow_mut().retain(|sibling| sibling != child);
		}
		let mut children = parent.0.children.borrow_mut();
		let index = match after {
			Some(after) => {
				children
					.iter()
					.position(|sibling| sibling == after)
					.unwrap_or_else(|| panic!("Inserted {:?} after {:?}, which isn't a child of {:?}", child, after, parent))
					+ 1
			}
			None => 0,
		};
		children.insert(index, child.clone());
		*child.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
	}

	fn remove_child(&self, parent: &MockNode, child: &MockNode) {
		self.count(|c| c.removes += 1);
		let mut children = parent.0.children.borrow_mut();
		let index = children
			.iter()
			.position(|sibling| sibling == child)
			.unwrap_or_else(|| panic!("Removed {:?}, which isn't a child of {:?}", child, parent));
		children.remove(index);
		*child.0.parent.borrow_mut() = Weak::new();
	}

	fn tag_name(&self, resource: &MockNode) -> Option<String> {
		resource.0.tag.clone()
	}
}
