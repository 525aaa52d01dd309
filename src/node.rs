//! Virtual nodes: the stateful, per-render counterpart of a [`Spec`].

use crate::{
	arena::Id,
	component::InstanceId,
	links::{HubId, LinkId},
	spec::{ComponentSpec, Deferred, ElementSpec, Key},
	Environment, Error, Result, Spec,
};
use std::rc::Rc;

pub(crate) type NodeId<E> = Id<VNode<E>>;

/// The closed set of node variants.
pub(crate) enum NodeKind<E: Environment> {
	Resource {
		spec: Rc<ElementSpec<E>>,
		namespace: Option<&'static str>,
		resource: Option<E::Resource>,
	},
	Component {
		spec: Rc<ComponentSpec<E>>,
		instance: Option<InstanceId<E>>,
	},
	Text {
		text: String,
		resource: Option<E::Resource>,
	},
	InlineFunction {
		read: Deferred<E>,
	},
	Null,
	ExternalResource {
		resource: E::Resource,
		children: Vec<Spec<E>>,
	},
	Group {
		key: Option<Key>,
		items: Vec<Spec<E>>,
	},
}

pub(crate) struct VNode<E: Environment> {
	pub kind: NodeKind<E>,
	pub parent: Option<NodeId<E>>,
	pub children: Vec<NodeId<E>>,
	/// The node's own slot in its enclosing Hub. Transparent nodes only have one while they have no children.
	pub link: Option<LinkId<E::Resource>>,
	/// Present on resource-owning nodes once attached.
	pub hub: Option<HubId<E::Resource>>,
}
impl<E: Environment> VNode<E> {
	pub fn new(kind: NodeKind<E>, parent: Option<NodeId<E>>) -> Self {
		Self {
			kind,
			parent,
			children: Vec::new(),
			link: None,
			hub: None,
		}
	}
}

impl<E: Environment> NodeKind<E> {
	pub fn matches(&self, candidate: &Self) -> bool {
		match (self, candidate) {
			(NodeKind::Resource { spec: a, .. }, NodeKind::Resource { spec: b, .. }) => a.tag == b.tag,
			(NodeKind::Component { spec: a, .. }, NodeKind::Component { spec: b, .. }) => a.identity == b.identity,
			(NodeKind::Text { .. }, NodeKind::Text { .. })
			| (NodeKind::InlineFunction { .. }, NodeKind::InlineFunction { .. })
			| (NodeKind::Null, NodeKind::Null)
			| (NodeKind::Group { .. }, NodeKind::Group { .. }) => true,
			(NodeKind::ExternalResource { resource: a, .. }, NodeKind::ExternalResource { resource: b, .. }) => a == b,
			_ => false,
		}
	}

	pub fn key(&self) -> Option<Key> {
		match self {
			NodeKind::Resource { spec, .. } => spec.key.clone(),
			NodeKind::Component { spec, .. } => spec.key.clone(),
			NodeKind::Group { key, .. } => key.clone(),
			NodeKind::Text { .. } | NodeKind::InlineFunction { .. } | NodeKind::Null | NodeKind::ExternalResource { .. } => None,
		}
	}

	pub fn variant_name(&self) -> &'static str {
		match self {
			NodeKind::Resource { .. } => "Resource",
			NodeKind::Component { .. } => "Component",
			NodeKind::Text { .. } => "Text",
			NodeKind::InlineFunction { .. } => "InlineFunction",
			NodeKind::Null => "Null",
			NodeKind::ExternalResource { .. } => "ExternalResource",
			NodeKind::Group { .. } => "Group",
		}
	}
}

/// Turns a specification into the matching node variant.
pub(crate) fn classify<E: Environment>(spec: Spec<E>) -> Result<NodeKind<E>> {
	Ok(match spec {
		Spec::Element(element) => {
			if !is_valid_tag(&element.tag) {
				return Err(Error::UnsupportedSpec(format!("Invalid tag name {:?}", element.tag)));
			}
			NodeKind::Resource {
				spec: element,
				namespace: None,
				resource: None,
			}
		}
		Spec::Component(component) => NodeKind::Component { spec: component, instance: None },
		Spec::Text(text) => NodeKind::Text { text, resource: None },
		Spec::Deferred(read) => NodeKind::InlineFunction { read },
		Spec::Null => NodeKind::Null,
		Spec::External(resource) => NodeKind::ExternalResource { resource, children: Vec::new() },
		Spec::Group { key, items } => NodeKind::Group { key, items },
	})
}

fn is_valid_tag(tag: &str) -> bool {
	!tag.is_empty() && !tag.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/' | '=' | '"' | '\'' | '\0'))
}
