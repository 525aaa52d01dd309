use crate::{
	arena::Arena,
	component::{Context, Hook, Instance, InstanceId, Phase},
	environment::{MATHML_NAMESPACE, SVG_NAMESPACE},
	links::{HubId, LinkId, Links},
	matcher,
	node::{classify, NodeId, NodeKind, VNode},
	plugins::{Mark, PluginSet, PluginStack},
	spec::{ComponentSpec, ElementSpec},
	AttrValue, Environment, Error, Rendered, Result, Spec,
};
use core::{cell::RefCell, mem};
use std::rc::{Rc, Weak};
use tracing::{instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// The outcome of a node's attach or update step.
struct Step<E: Environment> {
	/// [`None`] to leave the current children untouched.
	children: Option<Vec<Spec<E>>>,
	/// Plugins to drop again once the node is attached or updated.
	plugins: Option<Mark>,
}
impl<E: Environment> Step<E> {
	fn children(children: Vec<Spec<E>>) -> Self {
		Self { children: Some(children), plugins: None }
	}
}

/// The virtual node tree reconciled against one live resource.
///
/// This is the whole mutable state of one render root: nodes, their Link/Hub bookkeeping,
/// component instances and the plugins currently in scope.
pub(crate) struct Tree<E: Environment> {
	pub env: Rc<E>,
	pub nodes: Arena<VNode<E>>,
	pub links: Links<E::Resource>,
	pub instances: Arena<Instance<E>>,
	pub plugins: PluginStack<E>,
	/// The component instance whose render function is running, if any.
	pub active: Option<InstanceId<E>>,
	pub root: NodeId<E>,
	pub this: Weak<RefCell<Tree<E>>>,
	depth: usize,
	depth_limit: usize,
}

impl<E: Environment> Tree<E> {
	/// Creates a tree whose root node owns a Hub for `hub_resource`.
	pub fn new(env: Rc<E>, depth_limit: usize, root: NodeKind<E>, hub_resource: Option<E::Resource>) -> Rc<RefCell<Self>> {
		Rc::new_cyclic(|this| {
			let mut nodes = Arena::new();
			let mut links = Links::new();
			let root = nodes.insert(VNode::new(root, None));
			nodes[root].hub = Some(links.new_hub(hub_resource));
			RefCell::new(Self {
				env,
				nodes,
				links,
				instances: Arena::new(),
				plugins: PluginStack::default(),
				active: None,
				root,
				this: this.clone(),
				depth: 0,
				depth_limit,
			})
		})
	}

	/// Reconciles the root's children against `specs`.
	#[instrument(skip(self, specs), fields(specs.len = specs.len()))]
	pub fn reconcile_root(&mut self, specs: Vec<Spec<E>>) -> Result<()> {
		let mark = self.plugins.mark();
		let result = self.reconcile_children(self.root, specs);
		self.unwind_plugins(mark, &result);
		result
	}

	/// Drops plugins left in scope by a pass that was aborted early.
	fn unwind_plugins(&mut self, mark: Mark, result: &Result<()>) {
		if result.is_err() {
			trace!("Dropping plugins of the aborted pass.");
			self.plugins.pop_to(mark);
		}
	}

	/// Resources directly below the root, in order.
	pub fn root_resources(&self) -> Vec<E::Resource> {
		self.nodes[self.root].children.iter().flat_map(|&child| self.resolved_resources(child)).collect()
	}

	/// The resolved resources within `node`'s passing links.
	pub fn resolved_resources(&self, node: NodeId<E>) -> Vec<E::Resource> {
		match (self.first_link(node), self.last_link(node)) {
			(Some(first), Some(last)) => self.links.resolved(first, last).into_iter().cloned().collect(),
			_ => Vec::new(),
		}
	}

	pub fn parent_resource(&self, node: NodeId<E>) -> Option<E::Resource> {
		self.enclosing_hub(node).and_then(|hub| self.links.hub_resource(hub).cloned())
	}

	/// Re-invokes a component instance and reconciles its subtree only.
	#[instrument(skip(self))]
	pub fn refresh(&mut self, instance: InstanceId<E>) -> Result<()> {
		let (node, name) = match self.instances.get(instance) {
			Some(instance) => (instance.node, instance.name),
			None => {
				warn!("Ignoring refresh of a removed component instance.");
				return Ok(());
			}
		};
		if self.active == Some(instance) {
			return Err(Error::InfiniteLoop { component: name });
		}
		let spec = match &self.nodes[node].kind {
			NodeKind::Component { spec, .. } => spec.clone(),
			other => panic!("malevich-dom bug: Component instance bound to {} node", other.variant_name()),
		};

		self.enter()?;
		let span = trace_span!("Refreshing component", name);
		let _enter = span.enter();
		let outer = self.plugins.mark();
		let result = (|| {
			let mark = self.push_plugins(&spec);
			if let Rendered::Spec(child) = self.render_component(instance, &spec)? {
				self.reconcile_children(node, vec![child])?;
			} else {
				trace!("Left as-is.");
			}
			if let Some(mark) = mark {
				self.plugins.pop_to(mark);
			}
			let hooks = mem::take(&mut self.instances[instance].hooks.on_update);
			self.run_hooks(instance, hooks)?;
			let hooks = mem::take(&mut self.instances[instance].hooks.on_render);
			self.run_hooks(instance, hooks)
		})();
		self.unwind_plugins(outer, &result);
		self.depth -= 1;
		result
	}

	fn enter(&mut self) -> Result<()> {
		if self.depth >= self.depth_limit {
			return Err(Error::DepthLimitExceeded(self.depth_limit));
		}
		self.depth += 1;
		Ok(())
	}

	/// Classifies `specs`, pairs them with `parent`'s current children and dispatches each pair.
	fn reconcile_children(&mut self, parent: NodeId<E>, specs: Vec<Spec<E>>) -> Result<()> {
		let mut new = Vec::with_capacity(specs.len());
		for spec in specs {
			match classify(spec) {
				Ok(kind) => new.push(self.nodes.insert(VNode::new(kind, Some(parent)))),
				Err(error) => {
					self.discard_unattached(&new);
					return Err(error);
				}
			}
		}

		let old = mem::take(&mut self.nodes[parent].children);
		let pairing = {
			let nodes = &self.nodes;
			matcher::pair(&new, old.iter().copied(), |node| nodes[node].kind.key(), |new, old| nodes[new].kind.matches(&nodes[old].kind))
		};
		let pairing = match pairing {
			Ok(pairing) => pairing,
			Err(error) => {
				self.nodes[parent].children = old;
				self.discard_unattached(&new);
				return Err(error);
			}
		};

		for old in pairing.unclaimed {
			self.execute(None, Some(old), None)?;
		}

		let mut anchor = if self.nodes[parent].hub.is_some() { None } else { self.anchor_before(parent) };
		for (new, old) in pairing.pairs {
			self.nodes[parent].children.push(new);
			self.execute(Some(new), old, anchor)?;
			anchor = self.last_link(new);
		}

		if self.nodes[parent].children.is_empty() && self.nodes[parent].hub.is_none() && self.nodes[parent].link.is_none() {
			trace!("Transparent node emptied out. Keeping a placeholder slot.");
			let anchor = self.anchor_before(parent);
			if let Some(hub) = self.enclosing_hub(parent) {
				self.nodes[parent].link = Some(self.links.insert_after(hub, anchor));
			}
		}
		Ok(())
	}

	/// Drops freshly classified nodes that were never registered.
	fn discard_unattached(&mut self, nodes: &[NodeId<E>]) {
		for &node in nodes {
			self.nodes.remove(node);
		}
	}

	/// Reconciles one position. `anchor` is the Link the position's content must directly follow.
	fn execute(&mut self, new: Option<NodeId<E>>, old: Option<NodeId<E>>, anchor: Option<LinkId<E::Resource>>) -> Result<()> {
		self.enter()?;
		let result = self.execute_unguarded(new, old, anchor);
		self.depth -= 1;
		result
	}

	fn execute_unguarded(&mut self, new: Option<NodeId<E>>, old: Option<NodeId<E>>, anchor: Option<LinkId<E::Resource>>) -> Result<()> {
		let did_match = match (new, old) {
			(Some(new), Some(old)) => self.nodes[new].kind.matches(&self.nodes[old].kind),
			_ => false,
		};

		if let (Some(new), Some(old), true) = (new, old, did_match) {
			let span = trace_span!("Updating", variant = self.nodes[new].kind.variant_name());
			let _enter = span.enter();

			let old = self.substitute_in_place(old, new);
			self.place(new, anchor);

			let step = self.update(new, &old)?;
			match step.children {
				Some(children) => self.reconcile_children(new, children)?,
				None => trace!("Leaving subtree as-is."),
			}
			return self.updated(new, step.plugins);
		}

		if let Some(old) = old {
			if STATIC_MAX_LEVEL >= Level::WARN {
				if let (Some(NodeKind::Resource { spec: a, .. }), Some(NodeKind::Resource { spec: b, .. })) = (new.map(|new| &self.nodes[new].kind), Some(&self.nodes[old].kind)) {
					if a.tag != b.tag && a.tag.eq_ignore_ascii_case(&b.tag) {
						warn!("Recreating element due to different tag name casing: {:?} -> {:?}", b.tag, a.tag);
					}
				}
			}
			self.teardown(old, false)?;
		}

		if let Some(new) = new {
			let span = trace_span!("Attaching", variant = self.nodes[new].kind.variant_name());
			let _enter = span.enter();

			self.register_new_position(new, anchor);
			let step = self.attach(new)?;
			if let Some(children) = step.children {
				self.reconcile_children(new, children)?;
			}
			self.attached(new, step.plugins)?;
		}
		Ok(())
	}

	/// Gives `new` a slot directly after `anchor`.
	///
	/// The first child of a transparent node takes over its parent's placeholder slot instead,
	/// which keeps every transparent layer's passing links in step without touching them.
	fn register_new_position(&mut self, node: NodeId<E>, anchor: Option<LinkId<E::Resource>>) {
		let parent = match self.nodes[node].parent {
			Some(parent) => parent,
			None => return,
		};
		if self.nodes[parent].hub.is_none() {
			if let Some(placeholder) = self.nodes[parent].link.take() {
				trace!("Adopting parent's placeholder slot.");
				self.nodes[node].link = Some(placeholder);
				return;
			}
		}
		let hub = self.enclosing_hub(node).unwrap_or_else(|| panic!("malevich-dom bug: Registered node outside of any Hub"));
		self.nodes[node].link = Some(self.links.insert_after(hub, anchor));
	}

	/// Moves `old`'s slot, Hub, children and runtime state over to `new` and frees `old`.
	/// Returns `old`'s variant data for the update diff.
	fn substitute_in_place(&mut self, old: NodeId<E>, new: NodeId<E>) -> NodeKind<E> {
		let VNode {
			mut kind,
			parent,
			children,
			link,
			hub,
		} = self.nodes.remove(old).unwrap_or_else(|| panic!("malevich-dom bug: Matched a freed node"));
		debug_assert_eq!(parent, self.nodes[new].parent);

		for &child in &children {
			self.nodes[child].parent = Some(new);
		}
		let node = &mut self.nodes[new];
		node.children = children;
		node.link = link;
		node.hub = hub;

		match (&mut node.kind, &mut kind) {
			(NodeKind::Resource { resource: to, namespace: to_ns, .. }, NodeKind::Resource { resource: from, namespace: from_ns, .. }) => {
				*to = from.take();
				*to_ns = *from_ns;
			}
			(NodeKind::Text { resource: to, .. }, NodeKind::Text { resource: from, .. }) => *to = from.take(),
			(NodeKind::Component { instance: new_instance, .. }, NodeKind::Component { instance: old_instance, .. }) => {
				*new_instance = old_instance.take();
				if let Some(instance) = *new_instance {
					self.instances[instance].node = new;
				}
			}
			_ => (),
		}
		kind
	}

	/// Moves a matched node's content to directly after `anchor` if it isn't there already.
	fn place(&mut self, node: NodeId<E>, anchor: Option<LinkId<E::Resource>>) {
		let (first, last) = match (self.first_link(node), self.last_link(node)) {
			(Some(first), Some(last)) => (first, last),
			_ => return,
		};
		if self.links.follows(first, anchor) {
			return;
		}

		trace!("Moving reordered content.");
		self.links.move_after(first, last, anchor);
		let parent = match self.links.hub_resource(self.links.hub_of(first)) {
			Some(parent) => parent.clone(),
			None => return,
		};
		for link in self.links.run(first, last) {
			if let Some(resource) = self.links.resource(link) {
				self.env.insert(&parent, resource, self.links.insertion_sibling(link));
			}
		}
	}

	/// Creates or adopts the node's resource, or produces its children.
	fn attach(&mut self, node: NodeId<E>) -> Result<Step<E>> {
		let parent_resource = self.parent_resource(node);
		match &self.nodes[node].kind {
			NodeKind::Resource { spec, .. } => {
				let spec = spec.clone();
				let namespace = self.namespace_for(node, &spec.tag);
				let resource = match self.plugins.create_resource(&self.env, &spec, parent_resource.as_ref()) {
					Some(resource) => {
						trace!(tag = %spec.tag, "Resource provided by plugin.");
						resource
					}
					None => {
						trace!(tag = %spec.tag, ?namespace, "Creating element.");
						self.env.create_element(&spec.tag, namespace)
					}
				};
				for (name, value) in &spec.attributes {
					self.set_attribute(&resource, name, value, None);
				}
				self.resolve(node, resource.clone());
				let hub = self.links.new_hub(Some(resource.clone()));
				let vnode = &mut self.nodes[node];
				vnode.hub = Some(hub);
				if let NodeKind::Resource { resource: slot, namespace: ns, .. } = &mut vnode.kind {
					*slot = Some(resource);
					*ns = namespace;
				}
				Ok(Step::children(spec.children.clone()))
			}

			NodeKind::Text { text, .. } => {
				log_text("Creating text", text);
				let resource = self.env.create_text(text);
				self.resolve(node, resource.clone());
				if let NodeKind::Text { resource: slot, .. } = &mut self.nodes[node].kind {
					*slot = Some(resource);
				}
				Ok(Step::children(Vec::new()))
			}

			NodeKind::ExternalResource { resource, children } => {
				let resource = resource.clone();
				let children = children.clone();
				trace!(?resource, "Adopting external resource.");
				self.resolve(node, resource.clone());
				self.nodes[node].hub = Some(self.links.new_hub(Some(resource)));
				Ok(Step::children(children))
			}

			NodeKind::Null => Ok(Step::children(Vec::new())),
			NodeKind::Group { items, .. } => Ok(Step::children(items.clone())),
			NodeKind::InlineFunction { read } => Ok(Step::children(vec![read(parent_resource.as_ref())])),

			NodeKind::Component { spec, .. } => {
				let spec = spec.clone();
				let instance = self.instances.insert(Instance::new(node, spec.name));
				if let NodeKind::Component { instance: slot, .. } = &mut self.nodes[node].kind {
					*slot = Some(instance);
				}
				let plugins = self.push_plugins(&spec);
				let children = match self.render_component(instance, &spec)? {
					Rendered::Spec(child) => vec![child],
					Rendered::Leave => Vec::new(),
				};
				Ok(Step {
					children: Some(children),
					plugins,
				})
			}
		}
	}

	fn attached(&mut self, node: NodeId<E>, plugins: Option<Mark>) -> Result<()> {
		if let Some(mark) = plugins {
			self.plugins.pop_to(mark);
		}
		if let NodeKind::Component { instance: Some(instance), .. } = self.nodes[node].kind {
			self.instances[instance].attached = true;
			let hooks = mem::take(&mut self.instances[instance].hooks.on_create);
			self.run_hooks(instance, hooks)?;
			let hooks = mem::take(&mut self.instances[instance].hooks.on_render);
			self.run_hooks(instance, hooks)?;
		}
		Ok(())
	}

	/// Applies the difference between `old` and the node's (new) variant data.
	fn update(&mut self, node: NodeId<E>, old: &NodeKind<E>) -> Result<Step<E>> {
		match (&self.nodes[node].kind, old) {
			(NodeKind::Resource { spec, resource: Some(resource), .. }, NodeKind::Resource { spec: old_spec, .. }) => {
				let spec = spec.clone();
				let resource = resource.clone();
				self.update_attributes(&resource, old_spec, &spec);
				Ok(Step::children(spec.children.clone()))
			}

			(NodeKind::Text { text, resource: Some(resource) }, NodeKind::Text { text: old_text, .. }) => {
				if text != old_text {
					log_text("Updating text", text);
					self.env.set_text(resource, text);
				}
				Ok(Step::children(Vec::new()))
			}

			(NodeKind::ExternalResource { children, .. }, _) => Ok(Step::children(children.clone())),
			(NodeKind::Null, _) => Ok(Step::children(Vec::new())),
			(NodeKind::Group { items, .. }, _) => Ok(Step::children(items.clone())),
			(NodeKind::InlineFunction { read }, _) => {
				let read = read.clone();
				let parent_resource = self.parent_resource(node);
				Ok(Step::children(vec![read(parent_resource.as_ref())]))
			}

			(NodeKind::Component { spec, instance: Some(instance) }, _) => {
				let spec = spec.clone();
				let instance = *instance;
				let plugins = self.push_plugins(&spec);
				let children = match self.render_component(instance, &spec)? {
					Rendered::Spec(child) => Some(vec![child]),
					Rendered::Leave => None,
				};
				Ok(Step { children, plugins })
			}

			(new, old) => panic!("malevich-dom bug: Updating {} from {} without state", new.variant_name(), old.variant_name()),
		}
	}

	fn updated(&mut self, node: NodeId<E>, plugins: Option<Mark>) -> Result<()> {
		if let Some(mark) = plugins {
			self.plugins.pop_to(mark);
		}
		if let NodeKind::Component { instance: Some(instance), .. } = self.nodes[node].kind {
			let hooks = mem::take(&mut self.instances[instance].hooks.on_update);
			self.run_hooks(instance, hooks)?;
			let hooks = mem::take(&mut self.instances[instance].hooks.on_render);
			self.run_hooks(instance, hooks)?;
		}
		Ok(())
	}

	/// Detaches `node`, tears down its subtree and frees it.
	///
	/// If `owner_gone`, the resource hosting this node's resources is being removed too,
	/// so there is no need to take them out of it individually.
	fn teardown(&mut self, node: NodeId<E>, owner_gone: bool) -> Result<()> {
		let span = trace_span!("Detaching", variant = self.nodes[node].kind.variant_name(), owner_gone);
		let _enter = span.enter();

		match &self.nodes[node].kind {
			NodeKind::Component { instance: Some(instance), .. } => {
				let instance = *instance;
				let hooks = mem::take(&mut self.instances[instance].hooks.on_remove);
				self.run_hooks(instance, hooks)?;
			}
			NodeKind::Resource { resource: Some(resource), .. } | NodeKind::Text { resource: Some(resource), .. } | NodeKind::ExternalResource { resource, .. } => {
				if let NodeKind::Resource { spec, .. } = &self.nodes[node].kind {
					self.unbind_listeners(resource, spec);
				}
				if !owner_gone {
					if let Some(parent) = self.parent_resource(node) {
						trace!(?resource, "Removing resource.");
						self.env.remove_child(&parent, resource);
					}
				}
			}
			_ => (),
		}
		if let Some(link) = self.nodes[node].link.take() {
			self.links.remove(link);
		}

		let children = mem::take(&mut self.nodes[node].children);
		let owner_gone = owner_gone || self.nodes[node].hub.is_some();
		for child in children {
			self.teardown(child, owner_gone)?;
		}

		let node = self.nodes.remove(node).unwrap_or_else(|| panic!("malevich-dom bug: Tore down a freed node"));
		if let Some(hub) = node.hub {
			self.links.drop_hub(hub);
		}
		if let NodeKind::Component { instance: Some(instance), .. } = node.kind {
			self.instances.remove(instance);
		}
		Ok(())
	}

	fn render_component(&mut self, instance: InstanceId<E>, spec: &ComponentSpec<E>) -> Result<Rendered<E>> {
		let span = trace_span!("Rendering component", name = spec.name);
		let _enter = span.enter();

		let hooks = &mut self.instances[instance].hooks;
		hooks.on_create.clear();
		hooks.on_update.clear();
		hooks.on_remove.clear();
		hooks.on_render.clear();

		let previous = self.active.replace(instance);
		let render = spec.render.clone();
		let result = render(&mut Context::new(self, instance, Phase::Render), &*spec.props, &spec.children);
		self.active = previous;
		result
	}

	fn run_hooks(&mut self, instance: InstanceId<E>, hooks: Vec<Hook<E>>) -> Result<()> {
		for hook in hooks {
			hook(&mut Context::new(self, instance, Phase::Hook))?;
		}
		Ok(())
	}

	fn push_plugins(&mut self, spec: &ComponentSpec<E>) -> Option<Mark> {
		let register = spec.plugins?;
		let mut set = PluginSet::default();
		register(&mut set);
		if set.is_empty() {
			None
		} else {
			Some(self.plugins.push(set))
		}
	}

	/// Records `resource` as the node's slot content and inserts it into the hosting resource.
	fn resolve(&mut self, node: NodeId<E>, resource: E::Resource) {
		let link = self.nodes[node].link.unwrap_or_else(|| panic!("malevich-dom bug: Resolving a node without slot"));
		if let Some(parent) = self.links.hub_resource(self.links.hub_of(link)) {
			self.env.insert(parent, &resource, self.links.insertion_sibling(link));
		}
		self.links.resolve(link, resource);
	}

	fn update_attributes(&self, resource: &E::Resource, old: &ElementSpec<E>, new: &ElementSpec<E>) {
		for (name, old_value) in &old.attributes {
			if new.attribute(name).is_none() {
				self.remove_attribute(resource, name, old_value);
			}
		}
		for (name, value) in &new.attributes {
			match old.attribute(name) {
				Some(old_value) if old_value.same(value) => (),
				previous => self.set_attribute(resource, name, value, previous),
			}
		}
	}

	fn set_attribute(&self, resource: &E::Resource, name: &str, value: &AttrValue<E>, previous: Option<&AttrValue<E>>) {
		if self.plugins.set_attribute(&self.env, resource, name, Some(value)) {
			trace!(name, "Attribute assignment handled by plugin.");
			return;
		}
		if let Some(AttrValue::Listener(previous)) = previous {
			self.env.remove_event_listener(resource, event_name(name), previous);
		}
		match value {
			AttrValue::Text(text) => {
				#[cfg(feature = "dangerous-logging")]
				trace!(name, value = %text, "Setting attribute.");
				#[cfg(not(feature = "dangerous-logging"))]
				trace!(name, value.len = text.len(), "Setting attribute.");
				self.env.set_attribute(resource, name, text);
			}
			AttrValue::Flag(true) => self.env.set_attribute(resource, name, ""),
			AttrValue::Flag(false) => {
				if matches!(previous, Some(AttrValue::Text(_) | AttrValue::Flag(true))) {
					self.env.remove_attribute(resource, name);
				}
			}
			AttrValue::Listener(listener) => self.env.add_event_listener(resource, event_name(name), listener),
		}
	}

	/// Releases the listener bindings of a resource that is going away, attached or not.
	fn unbind_listeners(&self, resource: &E::Resource, spec: &ElementSpec<E>) {
		for (name, value) in &spec.attributes {
			if let AttrValue::Listener(listener) = value {
				trace!(name = %name, "Unbinding listener.");
				self.env.remove_event_listener(resource, event_name(name), listener);
			}
		}
	}

	fn remove_attribute(&self, resource: &E::Resource, name: &str, old_value: &AttrValue<E>) {
		if self.plugins.set_attribute(&self.env, resource, name, None) {
			trace!(name, "Attribute removal handled by plugin.");
			return;
		}
		match old_value {
			AttrValue::Listener(listener) => self.env.remove_event_listener(resource, event_name(name), listener),
			AttrValue::Flag(false) => (),
			AttrValue::Text(_) | AttrValue::Flag(true) => self.env.remove_attribute(resource, name),
		}
	}

	/// `svg` and `math` switch namespace for their subtree, `foreignObject` switches back.
	fn namespace_for(&self, node: NodeId<E>, tag: &str) -> Option<&'static str> {
		match tag {
			"svg" => return Some(SVG_NAMESPACE),
			"math" => return Some(MATHML_NAMESPACE),
			_ => (),
		}
		let mut cursor = self.nodes[node].parent;
		while let Some(ancestor) = cursor {
			if let NodeKind::Resource { spec, namespace, .. } = &self.nodes[ancestor].kind {
				return if spec.tag == "foreignObject" { None } else { *namespace };
			}
			cursor = self.nodes[ancestor].parent;
		}
		None
	}

	/// The Hub `node`'s slots live in: that of its nearest ancestor with one.
	fn enclosing_hub(&self, node: NodeId<E>) -> Option<HubId<E::Resource>> {
		let mut cursor = self.nodes[node].parent;
		while let Some(ancestor) = cursor {
			if let Some(hub) = self.nodes[ancestor].hub {
				return Some(hub);
			}
			cursor = self.nodes[ancestor].parent;
		}
		None
	}

	/// The Link `node`'s content must directly follow: the last slot of the nearest preceding sibling,
	/// looking through transparent ancestors. [`None`] means the front of the Hub.
	fn anchor_before(&self, node: NodeId<E>) -> Option<LinkId<E::Resource>> {
		let mut node = node;
		loop {
			let parent = self.nodes[node].parent?;
			let siblings = &self.nodes[parent].children;
			if let Some(index) = siblings.iter().position(|&sibling| sibling == node) {
				if index > 0 {
					return self.last_link(siblings[index - 1]);
				}
			}
			if self.nodes[parent].hub.is_some() {
				return None;
			}
			node = parent;
		}
	}

	fn first_link(&self, node: NodeId<E>) -> Option<LinkId<E::Resource>> {
		let mut node = node;
		loop {
			let vnode = &self.nodes[node];
			if vnode.link.is_some() {
				return vnode.link;
			}
			node = *vnode.children.first()?;
		}
	}

	fn last_link(&self, node: NodeId<E>) -> Option<LinkId<E::Resource>> {
		let mut node = node;
		loop {
			let vnode = &self.nodes[node];
			if vnode.link.is_some() {
				return vnode.link;
			}
			node = *vnode.children.last()?;
		}
	}
}

fn event_name(attribute: &str) -> &str {
	attribute.strip_prefix("on").unwrap_or(attribute)
}

#[cfg(feature = "dangerous-logging")]
fn log_text(message: &'static str, text: &str) {
	trace!(text, "{}", message);
}

#[cfg(not(feature = "dangerous-logging"))]
fn log_text(message: &'static str, text: &str) {
	trace!(text.len = text.len(), "{}", message);
}
