//! Scoped extension points for resource creation and attribute assignment.

use crate::{AttrValue, ElementSpec, Environment};
use std::rc::Rc;

/// May return a resource to use instead of creating one through the [`Environment`].
pub type CreateResourcePlugin<E> = Rc<dyn Fn(&E, &ElementSpec<E>, Option<&<E as Environment>::Resource>) -> Option<<E as Environment>::Resource>>;

/// May take over an attribute assignment (`Some`) or removal (`None`) by returning `true`.
pub type SetAttributePlugin<E> = Rc<dyn Fn(&E, &<E as Environment>::Resource, &str, Option<&AttrValue<E>>) -> bool>;

/// The plugins one component type contributes.
pub struct PluginSet<E: Environment> {
	create_resource: Vec<CreateResourcePlugin<E>>,
	set_attribute: Vec<SetAttributePlugin<E>>,
}
impl<E: Environment> Default for PluginSet<E> {
	fn default() -> Self {
		Self {
			create_resource: Vec::new(),
			set_attribute: Vec::new(),
		}
	}
}
impl<E: Environment> PluginSet<E> {
	pub fn create_resource(&mut self, plugin: impl Fn(&E, &ElementSpec<E>, Option<&E::Resource>) -> Option<E::Resource> + 'static) -> &mut Self {
		self.create_resource.push(Rc::new(plugin));
		self
	}

	pub fn set_attribute(&mut self, plugin: impl Fn(&E, &E::Resource, &str, Option<&AttrValue<E>>) -> bool + 'static) -> &mut Self {
		self.set_attribute.push(Rc::new(plugin));
		self
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.create_resource.is_empty() && self.set_attribute.is_empty()
	}
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
	create_resource: usize,
	set_attribute: usize,
}

/// The plugins currently in scope for one tree. Applied most-recently-added first, short-circuiting.
pub(crate) struct PluginStack<E: Environment> {
	create_resource: Vec<CreateResourcePlugin<E>>,
	set_attribute: Vec<SetAttributePlugin<E>>,
}
impl<E: Environment> Default for PluginStack<E> {
	fn default() -> Self {
		Self {
			create_resource: Vec::new(),
			set_attribute: Vec::new(),
		}
	}
}
impl<E: Environment> PluginStack<E> {
	/// Adds `set` and returns the mark to [`Self::pop_to`] once the span ends.
	pub fn push(&mut self, set: PluginSet<E>) -> Mark {
		let mark = self.mark();
		self.create_resource.extend(set.create_resource);
		self.set_attribute.extend(set.set_attribute);
		mark
	}

	pub fn push_create_resource(&mut self, plugin: CreateResourcePlugin<E>) -> Mark {
		let mark = self.mark();
		self.create_resource.push(plugin);
		mark
	}

	pub fn pop_to(&mut self, mark: Mark) {
		self.create_resource.truncate(mark.create_resource);
		self.set_attribute.truncate(mark.set_attribute);
	}

	pub fn create_resource(&self, env: &E, spec: &ElementSpec<E>, parent: Option<&E::Resource>) -> Option<E::Resource> {
		self.create_resource.iter().rev().find_map(|plugin| plugin(env, spec, parent))
	}

	pub fn set_attribute(&self, env: &E, resource: &E::Resource, name: &str, value: Option<&AttrValue<E>>) -> bool {
		self.set_attribute.iter().rev().any(|plugin| plugin(env, resource, name, value))
	}

	pub fn mark(&self) -> Mark {
		Mark {
			create_resource: self.create_resource.len(),
			set_attribute: self.set_attribute.len(),
		}
	}
}
