//! The live resource environment the reconciler drives.

use core::fmt::Debug;
use std::rc::Rc;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// An event handler bound through [`AttrValue::Listener`](`crate::AttrValue::Listener`).
///
/// Listeners are compared by pointer identity, so re-rendering with a clone of the same [`Rc`] doesn't rebind.
pub type Listener<Ev> = Rc<dyn Fn(&Ev)>;

/// Primitives for creating, mutating and arranging resources.
///
/// Implementations are expected to be cheap handles with interior mutability, like [`web_sys::Document`](https://docs.rs/web-sys/0.3/web_sys/struct.Document.html).
/// None of the methods report failure: the reconciler has no way to recover from a broken environment,
/// so implementations should log and carry on.
pub trait Environment: 'static {
	/// A handle to one live resource. [`PartialEq`] must be identity.
	type Resource: Clone + PartialEq + Debug + 'static;
	type Event: 'static;

	fn create_element(&self, tag: &str, namespace: Option<&'static str>) -> Self::Resource;
	fn create_text(&self, text: &str) -> Self::Resource;
	fn set_text(&self, resource: &Self::Resource, text: &str);

	fn set_attribute(&self, resource: &Self::Resource, name: &str, value: &str);
	fn remove_attribute(&self, resource: &Self::Resource, name: &str);

	fn add_event_listener(&self, resource: &Self::Resource, event: &str, listener: &Listener<Self::Event>);
	fn remove_event_listener(&self, resource: &Self::Resource, event: &str, listener: &Listener<Self::Event>);

	/// Inserts (or moves) `child` into `parent` directly after `after`, or as first child if `after` is [`None`].
	fn insert(&self, parent: &Self::Resource, child: &Self::Resource, after: Option<&Self::Resource>);
	fn remove_child(&self, parent: &Self::Resource, child: &Self::Resource);

	/// The element tag name, or [`None`] for non-element resources.
	fn tag_name(&self, resource: &Self::Resource) -> Option<String>;
}
