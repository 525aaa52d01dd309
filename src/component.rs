//! Component runtime: persistent per-instance state, lifecycle hooks and refreshes.

use crate::{arena::Id, diff::Tree, node::NodeId, Environment, Error, Rendered, Result};
use core::{
	any::Any,
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::Weak;
use tracing::{trace, warn};

pub(crate) type InstanceId<E> = Id<Instance<E>>;

/// Store key used by [`Context::use_state`].
const STATE_KEY: &str = "state";

/// A persistent key/value bag tied to a component instance's logical identity.
#[derive(Default)]
pub struct Store(HashMap<String, Box<dyn Any>>);
impl Store {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
		self.0.get(key).and_then(|value| value.downcast_ref())
	}

	pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
		self.0.get_mut(key).and_then(|value| value.downcast_mut())
	}

	/// Replaces and returns the previous value, if any.
	pub fn insert<T: 'static>(&mut self, key: impl Into<String>, value: T) -> Option<Box<dyn Any>> {
		self.0.insert(key.into(), Box::new(value))
	}

	/// Sets an entry, builder-style. Useful with [`Context::merge_store`].
	#[must_use]
	pub fn with<T: 'static>(mut self, key: impl Into<String>, value: T) -> Self {
		self.insert(key, value);
		self
	}

	pub fn remove(&mut self, key: &str) -> Option<Box<dyn Any>> {
		self.0.remove(key)
	}

	#[must_use]
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Shallow merge: entries of `other` replace same-named entries here.
	pub fn merge(&mut self, other: Store) {
		self.0.extend(other.0);
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for Store {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.0.keys()).finish()
	}
}

pub(crate) type Hook<E> = Box<dyn FnOnce(&mut Context<'_, E>) -> Result<()>>;

pub(crate) struct Hooks<E: Environment> {
	pub on_create: Vec<Hook<E>>,
	pub on_update: Vec<Hook<E>>,
	pub on_remove: Vec<Hook<E>>,
	pub on_render: Vec<Hook<E>>,
}
impl<E: Environment> Default for Hooks<E> {
	fn default() -> Self {
		Self {
			on_create: Vec::new(),
			on_update: Vec::new(),
			on_remove: Vec::new(),
			on_render: Vec::new(),
		}
	}
}

/// Runtime state of one component position. Outlives the individual nodes that render it.
pub(crate) struct Instance<E: Environment> {
	/// The node currently representing this instance.
	pub node: NodeId<E>,
	pub name: &'static str,
	pub store: Option<Store>,
	pub hooks: Hooks<E>,
	/// Set once the first attach completed.
	pub attached: bool,
}
impl<E: Environment> Instance<E> {
	pub fn new(node: NodeId<E>, name: &'static str) -> Self {
		Self {
			node,
			name,
			store: None,
			hooks: Hooks::default(),
			attached: false,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
	Render,
	Hook,
}

/// What a component sees while rendering or running a hook.
pub struct Context<'a, E: Environment> {
	tree: &'a mut Tree<E>,
	instance: InstanceId<E>,
	phase: Phase,
}
impl<'a, E: Environment> Context<'a, E> {
	pub(crate) fn new(tree: &'a mut Tree<E>, instance: InstanceId<E>, phase: Phase) -> Self {
		Self { tree, instance, phase }
	}

	pub fn env(&self) -> &E {
		&self.tree.env
	}

	/// The resources this instance currently resolves to, in order. Empty during the first render.
	#[must_use]
	pub fn resources(&self) -> Vec<E::Resource> {
		self.tree.resolved_resources(self.node())
	}

	#[must_use]
	pub fn resource(&self) -> Option<E::Resource> {
		self.resources().into_iter().next()
	}

	/// The resource this instance's resources are (or will be) children of.
	#[must_use]
	pub fn parent_resource(&self) -> Option<E::Resource> {
		self.tree.parent_resource(self.node())
	}

	/// Whether this is the instance's first render.
	#[must_use]
	pub fn is_attaching(&self) -> bool {
		!self.tree.instances[self.instance].attached
	}

	/// The instance's [`Store`], created empty on first access.
	pub fn store(&mut self) -> &mut Store {
		self.store_with(Store::new)
	}

	/// The instance's [`Store`], created through `init` on first access.
	pub fn store_with(&mut self, init: impl FnOnce() -> Store) -> &mut Store {
		self.tree.instances[self.instance].store.get_or_insert_with(init)
	}

	/// Runs after this instance and its subtree were attached.
	pub fn on_create(&mut self, hook: impl FnOnce(&mut Context<'_, E>) -> Result<()> + 'static) {
		self.tree.instances[self.instance].hooks.on_create.push(Box::new(hook));
	}

	/// Runs after this instance and its subtree were updated, including through a refresh.
	pub fn on_update(&mut self, hook: impl FnOnce(&mut Context<'_, E>) -> Result<()> + 'static) {
		self.tree.instances[self.instance].hooks.on_update.push(Box::new(hook));
	}

	/// Runs when this instance is removed, before its subtree is torn down.
	pub fn on_remove(&mut self, hook: impl FnOnce(&mut Context<'_, E>) -> Result<()> + 'static) {
		self.tree.instances[self.instance].hooks.on_remove.push(Box::new(hook));
	}

	/// Runs after every attach or update, after [`Self::on_create`] or [`Self::on_update`] hooks.
	pub fn on_render(&mut self, hook: impl FnOnce(&mut Context<'_, E>) -> Result<()> + 'static) {
		self.tree.instances[self.instance].hooks.on_render.push(Box::new(hook));
	}

	/// Re-invokes this component and reconciles only its subtree.
	///
	/// # Errors
	///
	/// [`Error::InfiniteLoop`] if called from this instance's own render.
	pub fn refresh(&mut self) -> Result<()> {
		self.ensure_not_rendering()?;
		self.tree.refresh(self.instance)
	}

	/// Keeps the current subtree untouched for this pass.
	#[must_use]
	pub fn leave(&self) -> Rendered<E> {
		Rendered::Leave
	}

	/// A handle to refresh this instance later, for example from an event listener.
	#[must_use]
	pub fn handle(&self) -> Handle<E> {
		Handle {
			tree: self.tree.this.clone(),
			instance: self.instance,
			name: self.tree.instances[self.instance].name,
		}
	}

	/// The instance's state, initialised through `init` on first use.
	pub fn use_state<S: Clone + 'static>(&mut self, init: impl FnOnce() -> S) -> S {
		let store = self.store();
		if let Some(state) = store.get::<S>(STATE_KEY) {
			return state.clone();
		}
		let state = init();
		store.insert(STATE_KEY, state.clone());
		state
	}

	/// Updates the state from [`Self::use_state`] in place and refreshes.
	///
	/// # Errors
	///
	/// [`Error::InfiniteLoop`] if called from this instance's own render. The state is left unchanged in that case.
	pub fn set_state<S: Default + 'static>(&mut self, update: impl FnOnce(&mut S)) -> Result<()> {
		self.ensure_not_rendering()?;
		update_state(self.store(), update);
		self.tree.refresh(self.instance)
	}

	/// Shallow-merges `entries` into the [`Store`] and refreshes.
	///
	/// # Errors
	///
	/// [`Error::InfiniteLoop`] if called from this instance's own render. The store is left unchanged in that case.
	pub fn merge_store(&mut self, entries: Store) -> Result<()> {
		self.ensure_not_rendering()?;
		self.store().merge(entries);
		self.tree.refresh(self.instance)
	}

	fn node(&self) -> NodeId<E> {
		self.tree.instances[self.instance].node
	}

	fn ensure_not_rendering(&self) -> Result<()> {
		if self.phase == Phase::Render || self.tree.active == Some(self.instance) {
			Err(Error::InfiniteLoop {
				component: self.tree.instances[self.instance].name,
			})
		} else {
			Ok(())
		}
	}
}

fn update_state<S: Default + 'static>(store: &mut Store, update: impl FnOnce(&mut S)) {
	match store.get_mut::<S>(STATE_KEY) {
		Some(state) => update(state),
		None => {
			let mut state = S::default();
			update(&mut state);
			store.insert(STATE_KEY, state);
		}
	}
}

/// Refreshes one component instance from outside of a render pass.
///
/// Handles don't keep the tree alive. Using one after [`Renderer::teardown`](`crate::Renderer::teardown`)
/// or after the instance was removed does nothing.
pub struct Handle<E: Environment> {
	tree: Weak<RefCell<Tree<E>>>,
	instance: InstanceId<E>,
	name: &'static str,
}
impl<E: Environment> Clone for Handle<E> {
	fn clone(&self) -> Self {
		Self {
			tree: self.tree.clone(),
			instance: self.instance,
			name: self.name,
		}
	}
}
impl<E: Environment> Debug for Handle<E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handle").field("name", &self.name).field("instance", &self.instance).finish()
	}
}
impl<E: Environment> Handle<E> {
	/// # Errors
	///
	/// [`Error::InfiniteLoop`] while any pass of the same tree is running.
	/// Inside hooks, use [`Context::refresh`] instead.
	pub fn refresh(&self) -> Result<()> {
		self.with_tree(|tree, instance| tree.refresh(instance))
	}

	/// See [`Context::set_state`].
	///
	/// # Errors
	///
	/// [`Error::InfiniteLoop`] while any pass of the same tree is running.
	pub fn set_state<S: Default + 'static>(&self, update: impl FnOnce(&mut S)) -> Result<()> {
		self.with_tree(|tree, instance| {
			update_state(tree.instances[instance].store.get_or_insert_with(Store::new), update);
			tree.refresh(instance)
		})
	}

	/// See [`Context::merge_store`].
	///
	/// # Errors
	///
	/// [`Error::InfiniteLoop`] while any pass of the same tree is running.
	pub fn merge_store(&self, entries: Store) -> Result<()> {
		self.with_tree(|tree, instance| {
			tree.instances[instance].store.get_or_insert_with(Store::new).merge(entries);
			tree.refresh(instance)
		})
	}

	fn with_tree(&self, f: impl FnOnce(&mut Tree<E>, InstanceId<E>) -> Result<()>) -> Result<()> {
		let tree = match self.tree.upgrade() {
			Some(tree) => tree,
			None => {
				warn!("Ignoring refresh of `{}`: Its tree was torn down.", self.name);
				return Ok(());
			}
		};
		let mut tree = tree.try_borrow_mut().map_err(|_| Error::InfiniteLoop { component: self.name })?;
		if !tree.instances.contains(self.instance) {
			warn!("Ignoring refresh of removed `{}`.", self.name);
			return Ok(());
		}
		trace!("Refreshing `{}` through handle.", self.name);
		f(&mut tree, self.instance)
	}
}
