use core::{
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
	marker::PhantomData,
	ops::{Index, IndexMut},
};

/// Generational index into an [`Arena<T>`]. Stale ids of reused slots don't resolve.
pub(crate) struct Id<T> {
	index: u32,
	generation: u32,
	_marker: PhantomData<fn() -> T>,
}
impl<T> Clone for Id<T> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<T> Copy for Id<T> {}
impl<T> PartialEq for Id<T> {
	fn eq(&self, other: &Self) -> bool {
		self.index == other.index && self.generation == other.generation
	}
}
impl<T> Eq for Id<T> {}
impl<T> Hash for Id<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.index.hash(state);
		self.generation.hash(state);
	}
}
impl<T> Debug for Id<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}v{}", self.index, self.generation)
	}
}

struct Slot<T> {
	generation: u32,
	value: Option<T>,
}

pub(crate) struct Arena<T> {
	slots: Vec<Slot<T>>,
	free_list: Vec<u32>,
	len: usize,
}
impl<T> Default for Arena<T> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T> Arena<T> {
	pub fn new() -> Self {
		Self {
			slots: Vec::new(),
			free_list: Vec::new(),
			len: 0,
		}
	}

	pub fn insert(&mut self, value: T) -> Id<T> {
		self.len += 1;
		if let Some(index) = self.free_list.pop() {
			let slot = &mut self.slots[index as usize];
			debug_assert!(slot.value.is_none());
			slot.value = Some(value);
			Id {
				index,
				generation: slot.generation,
				_marker: PhantomData,
			}
		} else {
			#[allow(clippy::cast_possible_truncation)]
			let index = self.slots.len() as u32;
			self.slots.push(Slot { generation: 0, value: Some(value) });
			Id {
				index,
				generation: 0,
				_marker: PhantomData,
			}
		}
	}

	pub fn remove(&mut self, id: Id<T>) -> Option<T> {
		let slot = self.slots.get_mut(id.index as usize)?;
		if slot.generation != id.generation {
			return None;
		}
		let value = slot.value.take()?;
		slot.generation = slot.generation.wrapping_add(1);
		self.free_list.push(id.index);
		self.len -= 1;
		Some(value)
	}

	pub fn get(&self, id: Id<T>) -> Option<&T> {
		self.slots.get(id.index as usize).filter(|slot| slot.generation == id.generation).and_then(|slot| slot.value.as_ref())
	}

	pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
		self.slots
			.get_mut(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.value.as_mut())
	}

	pub fn contains(&self, id: Id<T>) -> bool {
		self.get(id).is_some()
	}

	pub fn len(&self) -> usize {
		self.len
	}
}
impl<T> Index<Id<T>> for Arena<T> {
	type Output = T;

	fn index(&self, id: Id<T>) -> &T {
		self.get(id).unwrap_or_else(|| panic!("malevich-dom bug: Dangling arena id {:?}", id))
	}
}
impl<T> IndexMut<Id<T>> for Arena<T> {
	fn index_mut(&mut self, id: Id<T>) -> &mut T {
		self.get_mut(id).unwrap_or_else(|| panic!("malevich-dom bug: Dangling arena id {:?}", id))
	}
}
