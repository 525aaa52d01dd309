//! Position tracking through transparent layers.
//!
//! Every resource-owning node owns a [`Hub`]: the ordered list of [`Link`]s (slots) for the content it hosts.
//! A node that doesn't own a resource occupies a contiguous run of Links in the Hub of its nearest owning ancestor,
//! its "passing links". Runs of nested nodes are nested within each other, so resolving the innermost slot
//! also resolves it for every transparent layer around it.
//!
//! Links form an arena-indexed doubly linked list per Hub, so splicing and neighbour queries are O(1).

use crate::arena::{Arena, Id};

pub(crate) type LinkId<R> = Id<Link<R>>;
pub(crate) type HubId<R> = Id<Hub<R>>;

/// One occupied slot in a Hub.
pub(crate) struct Link<R> {
	hub: HubId<R>,
	resource: Option<R>,
	prev: Option<LinkId<R>>,
	next: Option<LinkId<R>>,
}

/// The ordered slots belonging to one resource-owning node.
pub(crate) struct Hub<R> {
	resource: Option<R>,
	head: Option<LinkId<R>>,
	tail: Option<LinkId<R>>,
}

pub(crate) struct Links<R> {
	links: Arena<Link<R>>,
	hubs: Arena<Hub<R>>,
}
impl<R> Default for Links<R> {
	fn default() -> Self {
		Self::new()
	}
}
impl<R> Links<R> {
	pub fn new() -> Self {
		Self {
			links: Arena::new(),
			hubs: Arena::new(),
		}
	}

	/// Creates an empty Hub hosting children of `resource`.
	///
	/// A Hub without resource collects resolved resources without inserting them anywhere.
	pub fn new_hub(&mut self, resource: Option<R>) -> HubId<R> {
		self.hubs.insert(Hub {
			resource,
			head: None,
			tail: None,
		})
	}

	/// Frees a Hub along with all Links still in it.
	pub fn drop_hub(&mut self, hub: HubId<R>) {
		let mut cursor = self.hubs[hub].head;
		while let Some(link) = cursor {
			cursor = self.links[link].next;
			self.links.remove(link);
		}
		self.hubs.remove(hub);
	}

	pub fn hub_resource(&self, hub: HubId<R>) -> Option<&R> {
		self.hubs[hub].resource.as_ref()
	}

	pub fn hub_of(&self, link: LinkId<R>) -> HubId<R> {
		self.links[link].hub
	}

	#[cfg(test)]
	pub fn first(&self, hub: HubId<R>) -> Option<LinkId<R>> {
		self.hubs[hub].head
	}

	#[cfg(test)]
	pub fn next(&self, link: LinkId<R>) -> Option<LinkId<R>> {
		self.links[link].next
	}

	pub fn resource(&self, link: LinkId<R>) -> Option<&R> {
		self.links[link].resource.as_ref()
	}

	/// Adds a fresh unresolved Link directly after `anchor`, or at the front of `hub` if there is none.
	pub fn insert_after(&mut self, hub: HubId<R>, anchor: Option<LinkId<R>>) -> LinkId<R> {
		debug_assert!(anchor.map_or(true, |anchor| self.links[anchor].hub == hub));
		let next = match anchor {
			Some(anchor) => self.links[anchor].next,
			None => self.hubs[hub].head,
		};
		let link = self.links.insert(Link {
			hub,
			resource: None,
			prev: anchor,
			next,
		});
		self.attach(hub, link, link, anchor, next);
		link
	}

	/// Unlinks and frees `link`, returning its resolved resource.
	pub fn remove(&mut self, link: LinkId<R>) -> Option<R> {
		self.detach(link, link);
		self.links.remove(link).and_then(|link| link.resource)
	}

	/// Resolution is monotonic within a pass: a resolved Link is only ever cleared by removing it.
	pub fn resolve(&mut self, link: LinkId<R>, resource: R) {
		let link = &mut self.links[link];
		debug_assert!(link.resource.is_none(), "Link resolved twice");
		link.resource = Some(resource);
	}

	/// The resource to insert `link`'s resource after: the nearest resolved Link before it.
	/// [`None`] means at the front of the Hub's resource.
	pub fn insertion_sibling(&self, link: LinkId<R>) -> Option<&R> {
		let mut cursor = self.links[link].prev;
		while let Some(link) = cursor {
			let link = &self.links[link];
			if link.resource.is_some() {
				return link.resource.as_ref();
			}
			cursor = link.prev;
		}
		None
	}

	/// Whether the run starting at `first` directly follows `anchor` (or starts the Hub).
	pub fn follows(&self, first: LinkId<R>, anchor: Option<LinkId<R>>) -> bool {
		self.links[first].prev == anchor
	}

	/// Moves the run `first..=last` to directly after `anchor`, which must lie outside of it.
	pub fn move_after(&mut self, first: LinkId<R>, last: LinkId<R>, anchor: Option<LinkId<R>>) {
		let hub = self.links[first].hub;
		debug_assert_eq!(hub, self.links[last].hub);
		self.detach(first, last);
		let next = match anchor {
			Some(anchor) => self.links[anchor].next,
			None => self.hubs[hub].head,
		};
		self.links[first].prev = anchor;
		self.links[last].next = next;
		self.attach(hub, first, last, anchor, next);
	}

	/// All Links of the run `first..=last`, in order.
	pub fn run(&self, first: LinkId<R>, last: LinkId<R>) -> Vec<LinkId<R>> {
		let mut run = vec![first];
		let mut cursor = first;
		while cursor != last {
			cursor = match self.links[cursor].next {
				Some(next) => next,
				None => panic!("malevich-dom bug: Link run ended before {:?}", last),
			};
			run.push(cursor);
		}
		run
	}

	/// The resolved resources of the run `first..=last`, in order.
	pub fn resolved(&self, first: LinkId<R>, last: LinkId<R>) -> Vec<&R> {
		self.run(first, last).into_iter().filter_map(|link| self.links[link].resource.as_ref()).collect()
	}

	pub fn link_count(&self) -> usize {
		self.links.len()
	}

	#[cfg(test)]
	pub fn hub_count(&self) -> usize {
		self.hubs.len()
	}

	fn detach(&mut self, first: LinkId<R>, last: LinkId<R>) {
		let hub = self.links[first].hub;
		let prev = self.links[first].prev;
		let next = self.links[last].next;
		match prev {
			Some(prev) => self.links[prev].next = next,
			None => self.hubs[hub].head = next,
		}
		match next {
			Some(next) => self.links[next].prev = prev,
			None => self.hubs[hub].tail = prev,
		}
	}

	fn attach(&mut self, hub: HubId<R>, first: LinkId<R>, last: LinkId<R>, prev: Option<LinkId<R>>, next: Option<LinkId<R>>) {
		match prev {
			Some(prev) => self.links[prev].next = Some(first),
			None => self.hubs[hub].head = Some(first),
		}
		match next {
			Some(next) => self.links[next].prev = Some(last),
			None => self.hubs[hub].tail = Some(last),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{HubId, Links};

	fn order(links: &Links<&'static str>, hub: HubId<&'static str>) -> Vec<Option<&'static str>> {
		let mut order = Vec::new();
		let mut cursor = links.first(hub);
		while let Some(link) = cursor {
			order.push(links.resource(link).copied());
			cursor = links.next(link);
		}
		order
	}

	#[test]
	fn insertion_sibling_skips_unresolved_links() {
		let mut links = Links::new();
		let hub = links.new_hub(Some("parent"));
		let a = links.insert_after(hub, None);
		let b = links.insert_after(hub, Some(a));
		let c = links.insert_after(hub, Some(b));

		assert_eq!(links.insertion_sibling(c), None);
		links.resolve(a, "a");
		assert_eq!(links.insertion_sibling(c), Some(&"a"));
		links.resolve(b, "b");
		assert_eq!(links.insertion_sibling(c), Some(&"b"));
		assert_eq!(links.insertion_sibling(a), None);
	}

	#[test]
	fn insert_after_splices_mid_list() {
		let mut links = Links::new();
		let hub = links.new_hub(None);
		let a = links.insert_after(hub, None);
		links.resolve(a, "a");
		let c = links.insert_after(hub, Some(a));
		links.resolve(c, "c");
		let b = links.insert_after(hub, Some(a));
		links.resolve(b, "b");
		let front = links.insert_after(hub, None);
		links.resolve(front, "front");

		assert_eq!(order(&links, hub), [Some("front"), Some("a"), Some("b"), Some("c")]);
		assert!(links.follows(b, Some(a)));
		assert!(links.follows(front, None));
	}

	#[test]
	fn move_after_relocates_whole_runs() {
		let mut links = Links::new();
		let hub = links.new_hub(None);
		let mut anchor = None;
		let mut ids = Vec::new();
		for name in ["a", "b", "c", "d"] {
			let link = links.insert_after(hub, anchor);
			links.resolve(link, name);
			ids.push(link);
			anchor = Some(link);
		}

		links.move_after(ids[2], ids[3], None);
		assert_eq!(order(&links, hub), [Some("c"), Some("d"), Some("a"), Some("b")]);

		links.move_after(ids[2], ids[2], Some(ids[1]));
		assert_eq!(order(&links, hub), [Some("d"), Some("a"), Some("b"), Some("c")]);
		assert_eq!(links.resolved(ids[0], ids[2]), [&"a", &"b", &"c"]);
	}

	#[test]
	fn removing_and_dropping_frees_links() {
		let mut links = Links::new();
		let hub = links.new_hub(None);
		let a = links.insert_after(hub, None);
		let b = links.insert_after(hub, Some(a));
		links.resolve(b, "b");

		assert_eq!(links.remove(b), Some("b"));
		assert_eq!(links.link_count(), 1);
		links.drop_hub(hub);
		assert_eq!(links.link_count(), 0);
		assert_eq!(links.hub_count(), 0);
	}
}
