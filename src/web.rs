//! A [`web_sys`]-backed [`Environment`] that drives the browser DOM.

use crate::{listener_callbacks::ListenerCallbacks, Environment, Listener};
use core::cell::RefCell;
use js_sys::Function;
use tracing::{error, instrument};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{CharacterData, Document, Element, Node};

/// Renders into the document given on construction.
///
/// Each distinct [`Listener`] is wrapped into one [`Closure`], shared by all elements it's bound to
/// and dropped once it's unbound everywhere.
pub struct DomEnvironment {
	document: Document,
	closures: RefCell<ListenerCallbacks<web_sys::Event, Closure<dyn Fn(web_sys::Event)>>>,
}
impl DomEnvironment {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			closures: RefCell::default(),
		}
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// How many JavaScript closures are currently alive for bound listeners.
	#[must_use]
	pub fn closure_count(&self) -> usize {
		self.closures.borrow().len()
	}
}

impl Environment for DomEnvironment {
	type Resource = Node;
	type Event = web_sys::Event;

	#[instrument(skip(self))]
	fn create_element(&self, tag: &str, namespace: Option<&'static str>) -> Node {
		let created = match namespace {
			Some(namespace) => self.document.create_element_ns(Some(namespace), tag),
			None => self.document.create_element(tag),
		};
		match created {
			Ok(element) => element.into(),
			Err(error) => {
				error!("Failed to create <{}>: {:?}; Substituting an empty comment.", tag, error);
				self.document.create_comment("").into()
			}
		}
	}

	fn create_text(&self, text: &str) -> Node {
		self.document.create_text_node(text).into()
	}

	fn set_text(&self, resource: &Node, text: &str) {
		match resource.dyn_ref::<CharacterData>() {
			Some(character_data) => character_data.set_data(text),
			None => error!("Expected to update `web_sys::CharacterData` but found {:?}.", resource),
		}
	}

	#[instrument(skip(self, value))]
	fn set_attribute(&self, resource: &Node, name: &str, value: &str) {
		match resource.dyn_ref::<Element>() {
			Some(element) => {
				if let Err(error) = element.set_attribute(name, value) {
					error!("Failed to set attribute {:?}: {:?}", name, error)
				}
			}
			None => error!("Expected to set attribute {:?} on `web_sys::Element` but found {:?}.", name, resource),
		}
	}

	#[instrument(skip(self))]
	fn remove_attribute(&self, resource: &Node, name: &str) {
		match resource.dyn_ref::<Element>() {
			Some(element) => {
				if let Err(error) = element.remove_attribute(name) {
					error!("Failed to remove attribute {:?}: {:?}", name, error)
				}
			}
			None => error!("Expected to remove attribute {:?} from `web_sys::Element` but found {:?}.", name, resource),
		}
	}

	#[instrument(skip(self, listener))]
	fn add_event_listener(&self, resource: &Node, event: &str, listener: &Listener<web_sys::Event>) {
		let mut closures = self.closures.borrow_mut();
		let closure = match closures.bind(listener, |listener| Closure::wrap(Box::new(move |event: web_sys::Event| listener(&event)) as Box<dyn Fn(web_sys::Event)>)) {
			Ok(closure) => closure,
			Err(_) => return error!("Too many (more than 65k) active bindings of the same listener; Not adding {:?}.", event),
		};
		if let Err(error) = resource.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>()) {
			error!("Failed to add event listener {:?}: {:?}", event, error)
		}
	}

	#[instrument(skip(self, listener))]
	fn remove_event_listener(&self, resource: &Node, event: &str, listener: &Listener<web_sys::Event>) {
		let unbound = self.closures.borrow_mut().unbind(listener, |closure| {
			if let Err(error) = resource.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>()) {
				error!("Failed to remove event listener {:?}: {:?}", event, error)
			}
		});
		if !unbound {
			error!("malevich-dom bug: Removing unknown event listener {:?}.", event);
		}
	}

	fn insert(&self, parent: &Node, child: &Node, after: Option<&Node>) {
		let next_sibling = match after {
			Some(after) => after.next_sibling(),
			None => parent.first_child(),
		};
		if next_sibling.as_ref() == Some(child) {
			return;
		}
		if let Err(error) = parent.insert_before(child, next_sibling.as_ref()) {
			error!("Failed to insert node: {:?}", error)
		}
	}

	fn remove_child(&self, parent: &Node, child: &Node) {
		if let Err(error) = parent.remove_child(child) {
			error!("Failed to remove node: {:?}", error)
		}
	}

	fn tag_name(&self, resource: &Node) -> Option<String> {
		resource.dyn_ref::<Element>().map(Element::tag_name)
	}
}
