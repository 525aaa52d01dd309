//! Immutable "what should exist" descriptions.

use crate::{component::Context, environment::Listener, plugins::PluginSet, Environment, Result};
use core::{
	any::{type_name, Any, TypeId},
	fmt::{self, Debug, Display, Formatter},
};
use std::rc::Rc;

/// An explicit sibling key. Only used to match children across reorders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	Int(i64),
	Str(Rc<str>),
}
impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Key::Int(int) => Display::fmt(int, f),
			Key::Str(str) => Debug::fmt(str, f),
		}
	}
}
impl From<i64> for Key {
	fn from(int: i64) -> Self {
		Self::Int(int)
	}
}
impl From<i32> for Key {
	fn from(int: i32) -> Self {
		Self::Int(int.into())
	}
}
impl From<u32> for Key {
	fn from(int: u32) -> Self {
		Self::Int(int.into())
	}
}
impl From<&str> for Key {
	fn from(str: &str) -> Self {
		Self::Str(str.into())
	}
}
impl From<String> for Key {
	fn from(string: String) -> Self {
		Self::Str(string.into())
	}
}

/// An attribute value on an [`ElementSpec`].
pub enum AttrValue<E: Environment> {
	Text(String),
	/// `true` sets an empty attribute, `false` removes it.
	Flag(bool),
	/// Binds the event named by the attribute name minus its `on` prefix.
	Listener(Listener<E::Event>),
}
impl<E: Environment> AttrValue<E> {
	/// Value equality for text and flags, pointer identity for listeners.
	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(AttrValue::Text(a), AttrValue::Text(b)) => a == b,
			(AttrValue::Flag(a), AttrValue::Flag(b)) => a == b,
			(AttrValue::Listener(a), AttrValue::Listener(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}
impl<E: Environment> Clone for AttrValue<E> {
	fn clone(&self) -> Self {
		match self {
			AttrValue::Text(text) => AttrValue::Text(text.clone()),
			AttrValue::Flag(flag) => AttrValue::Flag(*flag),
			AttrValue::Listener(listener) => AttrValue::Listener(listener.clone()),
		}
	}
}
impl<E: Environment> Debug for AttrValue<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			AttrValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
			AttrValue::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
			AttrValue::Listener(listener) => f.debug_tuple("Listener").field(&Rc::as_ptr(listener).cast::<()>()).finish(),
		}
	}
}
impl<E: Environment> From<&str> for AttrValue<E> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
impl<E: Environment> From<String> for AttrValue<E> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
impl<E: Environment> From<bool> for AttrValue<E> {
	fn from(flag: bool) -> Self {
		Self::Flag(flag)
	}
}

/// A tag-named resource: type name, ordered attributes and child specifications.
pub struct ElementSpec<E: Environment> {
	pub tag: String,
	pub attributes: Vec<(String, AttrValue<E>)>,
	pub key: Option<Key>,
	pub children: Vec<Spec<E>>,
}
impl<E: Environment> ElementSpec<E> {
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			attributes: Vec::new(),
			key: None,
			children: Vec::new(),
		}
	}

	/// Sets an attribute, replacing an earlier one of the same name.
	#[must_use]
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue<E>>) -> Self {
		let name = name.into();
		let value = value.into();
		match self.attributes.iter_mut().find(|(n, _)| *n == name) {
			Some((_, v)) => *v = value,
			None => self.attributes.push((name, value)),
		}
		self
	}

	/// Shorthand for `.attr(format!("on{}", event), AttrValue::Listener(listener))`.
	#[must_use]
	pub fn on(self, event: &str, listener: impl Fn(&E::Event) + 'static) -> Self {
		let listener: Listener<E::Event> = Rc::new(listener);
		self.attr(format!("on{}", event), AttrValue::Listener(listener))
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<Spec<E>>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Spec<E>>,
	{
		self.children.extend(children.into_iter().map(Into::into));
		self
	}

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&AttrValue<E>> {
		self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
	}
}

/// Starts an [`ElementSpec`].
#[must_use]
pub fn element<E: Environment>(tag: impl Into<String>) -> ElementSpec<E> {
	ElementSpec::new(tag)
}

/// What a component render returns.
pub enum Rendered<E: Environment> {
	Spec(Spec<E>),
	/// Keep the current subtree as it is. See [`Context::leave`].
	Leave,
}
impl<E: Environment> From<Spec<E>> for Rendered<E> {
	fn from(spec: Spec<E>) -> Self {
		Self::Spec(spec)
	}
}

/// A function-based component.
///
/// The implementing type's identity is the component's identity:
/// two component specifications only match if they name the same type.
pub trait Component<E: Environment>: 'static {
	type Props: 'static;

	fn render(cx: &mut Context<'_, E>, props: &Self::Props, children: &[Spec<E>]) -> Result<Rendered<E>>;

	/// Extension functions active for descendants while an instance of this component is attaching or updating.
	fn plugins(_plugins: &mut PluginSet<E>) {}
}

pub(crate) type RenderFn<E> = Rc<dyn Fn(&mut Context<'_, E>, &dyn Any, &[Spec<E>]) -> Result<Rendered<E>>>;

/// A component invocation: component identity, props and children.
pub struct ComponentSpec<E: Environment> {
	pub(crate) identity: TypeId,
	pub(crate) name: &'static str,
	pub(crate) key: Option<Key>,
	pub(crate) props: Rc<dyn Any>,
	pub(crate) children: Vec<Spec<E>>,
	pub(crate) render: RenderFn<E>,
	pub(crate) plugins: Option<fn(&mut PluginSet<E>)>,
}
impl<E: Environment> ComponentSpec<E> {
	#[must_use]
	pub fn new<C: Component<E>>(props: C::Props) -> Self {
		Self {
			identity: TypeId::of::<C>(),
			name: type_name::<C>(),
			key: None,
			props: Rc::new(props),
			children: Vec::new(),
			render: Rc::new(|cx: &mut Context<'_, E>, props: &dyn Any, children: &[Spec<E>]| {
				#[allow(clippy::expect_used)]
				let props = props.downcast_ref::<C::Props>().expect("malevich-dom bug: Component props of the wrong type");
				C::render(cx, props, children)
			}),
			plugins: Some(C::plugins),
		}
	}

	/// A component from a closure (or `fn` item). Each closure literal is its own component identity.
	#[must_use]
	pub fn from_fn<F, P>(render: F, props: P) -> Self
	where
		F: Fn(&mut Context<'_, E>, &P, &[Spec<E>]) -> Result<Rendered<E>> + 'static,
		P: 'static,
	{
		Self {
			identity: TypeId::of::<F>(),
			name: type_name::<F>(),
			key: None,
			props: Rc::new(props),
			children: Vec::new(),
			render: Rc::new(move |cx: &mut Context<'_, E>, props: &dyn Any, children: &[Spec<E>]| {
				#[allow(clippy::expect_used)]
				let props = props.downcast_ref::<P>().expect("malevich-dom bug: Component props of the wrong type");
				render(cx, props, children)
			}),
			plugins: None,
		}
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<Spec<E>>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Spec<E>>,
	{
		self.children.extend(children.into_iter().map(Into::into));
		self
	}

	/// Registers plugins for closure components. Replaces those of a [`Component`] implementation.
	#[must_use]
	pub fn with_plugins(mut self, plugins: fn(&mut PluginSet<E>)) -> Self {
		self.plugins = Some(plugins);
		self
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}
}

pub type Deferred<E> = Rc<dyn Fn(Option<&<E as Environment>::Resource>) -> Spec<E>>;

/// The declarative description of one tree position.
pub enum Spec<E: Environment> {
	Null,
	Text(String),
	Element(Rc<ElementSpec<E>>),
	Component(Rc<ComponentSpec<E>>),
	/// Evaluated against the parent resource each time its position is attached or updated.
	Deferred(Deferred<E>),
	/// A pre-existing resource to place as-is.
	External(E::Resource),
	/// An ordered list of specifications, optionally keyed as a whole.
	Group { key: Option<Key>, items: Vec<Spec<E>> },
}
impl<E: Environment> Spec<E> {
	#[must_use]
	pub fn component<C: Component<E>>(props: C::Props) -> ComponentSpec<E> {
		ComponentSpec::new::<C>(props)
	}

	#[must_use]
	pub fn from_fn<F, P>(render: F, props: P) -> ComponentSpec<E>
	where
		F: Fn(&mut Context<'_, E>, &P, &[Spec<E>]) -> Result<Rendered<E>> + 'static,
		P: 'static,
	{
		ComponentSpec::from_fn(render, props)
	}

	pub fn deferred(read: impl Fn(Option<&E::Resource>) -> Spec<E> + 'static) -> Self {
		Self::Deferred(Rc::new(read))
	}

	/// The grouping marker: `items` as siblings, keyed as a unit by `key`.
	pub fn fragment<I>(key: Option<Key>, items: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Spec<E>>,
	{
		Self::Group {
			key,
			items: items.into_iter().map(Into::into).collect(),
		}
	}
}
impl<E: Environment> Clone for Spec<E> {
	fn clone(&self) -> Self {
		match self {
			Spec::Null => Spec::Null,
			Spec::Text(text) => Spec::Text(text.clone()),
			Spec::Element(element) => Spec::Element(element.clone()),
			Spec::Component(component) => Spec::Component(component.clone()),
			Spec::Deferred(read) => Spec::Deferred(read.clone()),
			Spec::External(resource) => Spec::External(resource.clone()),
			Spec::Group { key, items } => Spec::Group {
				key: key.clone(),
				items: items.clone(),
			},
		}
	}
}
impl<E: Environment> Debug for Spec<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Spec::Null => f.write_str("Null"),
			Spec::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Spec::Element(element) => f
				.debug_struct("Element")
				.field("tag", &element.tag)
				.field("attributes", &element.attributes)
				.field("key", &element.key)
				.field("children", &element.children)
				.finish(),
			Spec::Component(component) => f.debug_struct("Component").field("name", &component.name).field("key", &component.key).finish_non_exhaustive(),
			Spec::Deferred(_) => f.write_str("Deferred"),
			Spec::External(resource) => f.debug_tuple("External").field(resource).finish(),
			Spec::Group { key, items } => f.debug_struct("Group").field("key", key).field("items", items).finish(),
		}
	}
}

impl<E: Environment> From<&str> for Spec<E> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
impl<E: Environment> From<String> for Spec<E> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
impl<E: Environment> From<ElementSpec<E>> for Spec<E> {
	fn from(element: ElementSpec<E>) -> Self {
		Self::Element(Rc::new(element))
	}
}
impl<E: Environment> From<ComponentSpec<E>> for Spec<E> {
	fn from(component: ComponentSpec<E>) -> Self {
		Self::Component(Rc::new(component))
	}
}
impl<E: Environment> From<Vec<Spec<E>>> for Spec<E> {
	fn from(items: Vec<Spec<E>>) -> Self {
		Self::Group { key: None, items }
	}
}
impl<E: Environment, T: Into<Spec<E>>> From<Option<T>> for Spec<E> {
	fn from(spec: Option<T>) -> Self {
		spec.map_or(Self::Null, Into::into)
	}
}
impl<E: Environment> From<ElementSpec<E>> for Rendered<E> {
	fn from(element: ElementSpec<E>) -> Self {
		Self::Spec(element.into())
	}
}
impl<E: Environment> From<ComponentSpec<E>> for Rendered<E> {
	fn from(component: ComponentSpec<E>) -> Self {
		Self::Spec(component.into())
	}
}
