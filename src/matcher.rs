//! Pairs new children with old ones.

use crate::{spec::Key, Error, Result};
use core::hash::Hash;
use hashbrown::{hash_map::Entry, HashMap, HashSet};
use std::collections::VecDeque;

pub(crate) struct Pairing<T> {
	/// Each new child in declared order, with the old child it updates, if any.
	pub pairs: Vec<(T, Option<T>)>,
	/// Old children nobody claimed, in their old order. These are torn down.
	pub unclaimed: Vec<T>,
}

/// Keyed new children look up the old child with the same key. Unkeyed ones take the next unkeyed old child.
/// A candidate only becomes a pair if `matches(new, candidate)`.
///
/// Unkeyed matching is positional: reordering unkeyed siblings of the same kind reuses them by position.
pub(crate) fn pair<T: Copy + Eq + Hash>(
	new: &[T],
	old: impl IntoIterator<Item = T>,
	key: impl Fn(T) -> Option<Key>,
	matches: impl Fn(T, T) -> bool,
) -> Result<Pairing<T>> {
	let mut keyed = HashMap::new();
	let mut unkeyed = VecDeque::new();
	let mut old_order = Vec::new();
	for old in old {
		old_order.push(old);
		match key(old) {
			Some(key) => {
				if let Entry::Vacant(vacant) = keyed.entry(key) {
					vacant.insert(old);
				}
			}
			None => unkeyed.push_back(old),
		}
	}

	let mut seen = HashSet::new();
	let mut claimed = HashSet::with_capacity(new.len());
	let mut pairs = Vec::with_capacity(new.len());
	for &new in new {
		let candidate = match key(new) {
			Some(key) => {
				if !seen.insert(key.clone()) {
					return Err(Error::DuplicateKey(key));
				}
				keyed.remove(&key)
			}
			None => unkeyed.pop_front(),
		};
		let old = candidate.filter(|&candidate| matches(new, candidate));
		if let Some(old) = old {
			claimed.insert(old);
		}
		pairs.push((new, old));
	}

	let unclaimed = old_order.into_iter().filter(|old| !claimed.contains(old)).collect();
	Ok(Pairing { pairs, unclaimed })
}

#[cfg(test)]
mod tests {
	use super::pair;
	use crate::{spec::Key, Error};

	/// (kind, key, id)
	type Item = (char, Option<i64>, usize);

	fn run(new: &[Item], old: &[Item]) -> (Vec<(usize, Option<usize>)>, Vec<usize>) {
		let pairing = pair(new, old.iter().copied(), |(_, key, _)| key.map(Key::Int), |(a, ..), (b, ..)| a == b).unwrap();
		(
			pairing.pairs.into_iter().map(|(new, old)| (new.2, old.map(|old| old.2))).collect(),
			pairing.unclaimed.into_iter().map(|old| old.2).collect(),
		)
	}

	#[test]
	fn keys_follow_reorders() {
		let old = [('a', Some(1), 0), ('b', Some(2), 1)];
		let new = [('b', Some(2), 10), ('a', Some(1), 11)];
		assert_eq!(run(&new, &old), (vec![(10, Some(1)), (11, Some(0))], vec![]));
	}

	#[test]
	fn unkeyed_matching_is_positional() {
		let old = [('t', None, 0), ('t', None, 1)];
		let new = [('t', None, 10)];
		assert_eq!(run(&new, &old), (vec![(10, Some(0))], vec![1]));
	}

	#[test]
	fn mismatching_candidates_are_unclaimed() {
		let old = [('t', None, 0), ('e', Some(5), 1)];
		let new = [('e', None, 10), ('t', Some(5), 11)];
		assert_eq!(run(&new, &old), (vec![(10, None), (11, None)], vec![0, 1]));
	}

	#[test]
	fn keyed_and_unkeyed_are_separate_pools() {
		let old = [('t', Some(1), 0), ('t', None, 1)];
		let new = [('t', None, 10), ('t', Some(1), 11), ('t', None, 12)];
		assert_eq!(run(&new, &old), (vec![(10, Some(1)), (11, Some(0)), (12, None)], vec![]));
	}

	#[test]
	fn unclaimed_keep_their_old_order_in_long_lists() {
		let old: Vec<Item> = (0..4000).map(|i| ('t', Some(i), i as usize)).collect();
		let new: Vec<Item> = (0..4000).rev().step_by(2).map(|i| ('t', Some(i), 10_000 + i as usize)).collect();
		let (pairs, unclaimed) = run(&new, &old);
		assert!(pairs.iter().all(|(new, old)| old == &Some(new - 10_000)));
		assert_eq!(unclaimed, (0..4000).step_by(2).collect::<Vec<_>>());
	}

	#[test]
	fn duplicate_new_keys_fail() {
		let new = [('t', Some(7), 10), ('t', Some(7), 11)];
		let result = pair(&new, [], |(_, key, _): Item| key.map(Key::Int), |_, _| true);
		assert!(matches!(result, Err(Error::DuplicateKey(Key::Int(7)))));
	}
}
