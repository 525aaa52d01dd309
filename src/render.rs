use crate::{diff::Tree, node::NodeKind, ElementSpec, Environment, Error, Result, Spec};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, instrument, trace};

/// Runtime configuration of a [`Renderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
	/// How deeply the dispatcher may recurse (through nodes and refreshes) before failing with [`Error::DepthLimitExceeded`].
	pub depth_limit: usize,
}
impl Default for Config {
	fn default() -> Self {
		Self { depth_limit: 256 }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
	Render,
	Sync,
}

struct Root<E: Environment> {
	resource: E::Resource,
	mode: Mode,
	tree: Rc<RefCell<Tree<E>>>,
}

/// Entry points wiring live resources to the reconciler.
///
/// The previous top-level node of each live resource is retained here between calls,
/// so that later calls update instead of recreating.
///
/// # Correct Use
///
/// Resources managed through a [`Renderer`] must not be rearranged by other code between calls.
/// Unmanaged children already present in a rendered resource stay behind the managed ones.
pub struct Renderer<E: Environment> {
	env: Rc<E>,
	config: Config,
	roots: Vec<Root<E>>,
}
impl<E: Environment> Renderer<E> {
	#[must_use]
	pub fn new(env: E) -> Self {
		Self::with_config(env, Config::default())
	}

	#[must_use]
	pub fn with_config(env: E, config: Config) -> Self {
		Self {
			env: Rc::new(env),
			config,
			roots: Vec::new(),
		}
	}

	pub fn env(&self) -> &E {
		&self.env
	}

	/// Reconciles `spec` (or each item of a list) as the children of `live`, which is left in place itself.
	///
	/// # Errors
	///
	/// Any [`Error`] raised during the pass. The pass is aborted there, without rollback.
	#[instrument(skip(self, spec))]
	pub fn render(&mut self, live: &E::Resource, spec: impl Into<Spec<E>>) -> Result<E::Resource> {
		let specs = match spec.into() {
			Spec::Group { key: None, items } => items,
			spec => vec![spec],
		};
		let tree = self.root(live, Mode::Render, || {
			(
				NodeKind::ExternalResource {
					resource: live.clone(),
					children: Vec::new(),
				},
				Some(live.clone()),
			)
		});
		let mut tree = tree.try_borrow_mut().map_err(|_| Error::InfiniteLoop { component: "<render root>" })?;
		tree.reconcile_root(specs)?;
		debug!("Node/link count: {}/{}", tree.nodes.len(), tree.links.link_count());
		Ok(live.clone())
	}

	/// Reconciles `live` itself against `spec`, which must resolve to exactly that resource.
	///
	/// A top-level element with the same tag name adopts `live` instead of creating a new resource.
	///
	/// # Errors
	///
	/// [`Error::SpecMismatch`] if the result is anything other than `live` alone. `live` is left unmodified if
	/// the mismatch is apparent from the specification itself, otherwise only the adopting element's changes apply.
	/// Other [`Error`]s as for [`Self::render`].
	#[instrument(skip(self, spec))]
	pub fn sync(&mut self, live: &E::Resource, spec: impl Into<Spec<E>>) -> Result<E::Resource> {
		let spec = spec.into();
		let tag = self.env.tag_name(live);
		precheck(&spec, live, tag.as_deref())?;

		let tree = self.root(live, Mode::Sync, || (NodeKind::Group { key: None, items: Vec::new() }, None));
		let result = {
			let mut tree = tree.try_borrow_mut().map_err(|_| Error::InfiniteLoop { component: "<sync root>" })?;
			let adopted = live.clone();
			let mark = tree.plugins.push_create_resource(Rc::new(move |env: &E, spec: &ElementSpec<E>, parent: Option<&E::Resource>| {
				if parent.is_none() && env.tag_name(&adopted).map_or(false, |tag| tag.eq_ignore_ascii_case(&spec.tag)) {
					trace!("Adopting synchronised resource.");
					Some(adopted.clone())
				} else {
					None
				}
			}));
			let result = tree.reconcile_root(vec![spec]);
			tree.plugins.pop_to(mark);
			result.and_then(|()| match tree.root_resources().as_slice() {
				[resource] if resource == live => Ok(()),
				resolved => Err(Error::SpecMismatch(format!("Expected {:?} but resolved to {:?}", live, resolved))),
			})
		};
		if result.is_err() {
			self.teardown(live);
		}
		result.map(|()| live.clone())
	}

	/// Drops the retained state for `live`. The live resource tree itself is left as it is.
	#[instrument(skip(self))]
	pub fn teardown(&mut self, live: &E::Resource) {
		let before = self.roots.len();
		self.roots.retain(|root| root.resource != *live);
		trace!("Dropped {} root(s).", before - self.roots.len());
	}

	/// Whether state for `live` is retained.
	#[must_use]
	pub fn is_tracking(&self, live: &E::Resource) -> bool {
		self.roots.iter().any(|root| root.resource == *live)
	}

	fn root(&mut self, live: &E::Resource, mode: Mode, kind: impl FnOnce() -> (NodeKind<E>, Option<E::Resource>)) -> Rc<RefCell<Tree<E>>> {
		if let Some(root) = self.roots.iter().find(|root| root.resource == *live) {
			if root.mode == mode {
				return root.tree.clone();
			}
		}
		self.roots.retain(|root| root.resource != *live);
		let (kind, hub_resource) = kind();
		let tree = Tree::new(self.env.clone(), self.config.depth_limit, kind, hub_resource);
		self.roots.push(Root {
			resource: live.clone(),
			mode,
			tree: tree.clone(),
		});
		tree
	}
}

/// Rejects specifications that can't possibly resolve to `live`, before anything is touched.
fn precheck<E: Environment>(spec: &Spec<E>, live: &E::Resource, tag: Option<&str>) -> Result<()> {
	match spec {
		Spec::Element(element) => match tag {
			Some(tag) if tag.eq_ignore_ascii_case(&element.tag) => Ok(()),
			_ => Err(Error::SpecMismatch(format!("Expected <{}> but found {:?}", element.tag, live))),
		},
		Spec::External(resource) if resource == live => Ok(()),
		Spec::Group { items, .. } if items.len() == 1 => precheck(&items[0], live, tag),
		Spec::Component(_) | Spec::Deferred(_) => Ok(()),
		other => Err(Error::SpecMismatch(format!("{:?} can't resolve to {:?}", other, live))),
	}
}
