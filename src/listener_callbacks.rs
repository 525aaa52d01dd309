//! Shares one wrapped callback per distinct [`Listener`] between all resources it is bound to.

use crate::Listener;
use hashbrown::{hash_map::Entry, HashMap};
use std::rc::Rc;
use tracing::trace;

/// Listener identity: The address of the shared allocation.
///
/// Each entry holds a clone of its [`Listener`], so the address can't be reused while the entry exists.
type ListenerKey = *const ();

fn listener_key<Ev>(listener: &Listener<Ev>) -> ListenerKey {
	Rc::as_ptr(listener).cast::<()>()
}

struct Binding<Ev, C> {
	listener: Listener<Ev>,
	count: u16,
	callback: C,
}

/// Returned when one listener is bound to more than [`u16::MAX`] resources at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooManyBindings;

/// Wrapped callbacks `C` for bound listeners, each dropped together with its last binding.
pub(crate) struct ListenerCallbacks<Ev, C> {
	bindings: HashMap<ListenerKey, Binding<Ev, C>>,
}
impl<Ev, C> Default for ListenerCallbacks<Ev, C> {
	fn default() -> Self {
		Self { bindings: HashMap::new() }
	}
}
impl<Ev, C> ListenerCallbacks<Ev, C> {
	/// Counts one more binding of `listener` and returns its callback, wrapping it first if it wasn't bound yet.
	pub fn bind(&mut self, listener: &Listener<Ev>, wrap: impl FnOnce(Listener<Ev>) -> C) -> Result<&C, TooManyBindings> {
		match self.bindings.entry(listener_key(listener)) {
			Entry::Occupied(occupied) => {
				let binding = occupied.into_mut();
				binding.count = binding.count.checked_add(1).ok_or(TooManyBindings)?;
				Ok(&binding.callback)
			}
			Entry::Vacant(vacant) => {
				trace!("Wrapping listener.");
				let binding = vacant.insert(Binding {
					listener: listener.clone(),
					count: 1,
					callback: wrap(listener.clone()),
				});
				Ok(&binding.callback)
			}
		}
	}

	/// Hands the callback of `listener` to `unbind`, then releases one binding.
	///
	/// Returns `false` if `listener` isn't bound at all.
	pub fn unbind(&mut self, listener: &Listener<Ev>, unbind: impl FnOnce(&C)) -> bool {
		let key = listener_key(listener);
		let binding = match self.bindings.get_mut(&key) {
			Some(binding) => binding,
			None => return false,
		};
		debug_assert!(Rc::ptr_eq(&binding.listener, listener));
		unbind(&binding.callback);
		binding.count -= 1;
		if binding.count == 0 {
			self.bindings.remove(&key);
			trace!("Dropped wrapped listener.");
		}
		true
	}

	/// How many distinct listeners are currently bound.
	pub fn len(&self) -> usize {
		self.bindings.len()
	}
}
