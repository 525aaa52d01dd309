//! Arbitrary sequences of renders must leave exactly the expected markup behind,
//! with moves and insertions checked against the live children by [`MockEnv`].

mod mock_env_;

use malevich_dom::{element, ComponentSpec, Context, Renderer, Rendered, Result, Spec};
use mock_env_::{init_logging, Counts, MockEnv};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Item {
	Null,
	Text(String),
	Element { tag: &'static str, key: Option<u32>, children: Vec<Item> },
	Group { key: Option<u32>, items: Vec<Item> },
	Wrap(Box<Item>),
}

fn arb_item() -> impl Strategy<Value = Item> {
	let leaf = prop_oneof![
		Just(Item::Null),
		"[ab]{0,2}".prop_map(Item::Text),
		(prop::sample::select(&["div", "p", "span"][..]), prop::option::of(0..4_u32)).prop_map(|(tag, key)| Item::Element { tag, key, children: Vec::new() }),
	];
	leaf.prop_recursive(4, 32, 4, |inner| {
		prop_oneof![
			(prop::sample::select(&["div", "p"][..]), prop::option::of(0..4_u32), prop::collection::vec(inner.clone(), 0..4))
				.prop_map(|(tag, key, children)| Item::Element { tag, key, children: dedupe(children) }),
			(prop::option::of(0..4_u32), prop::collection::vec(inner.clone(), 0..4)).prop_map(|(key, items)| Item::Group { key, items: dedupe(items) }),
			inner.prop_map(|item| Item::Wrap(Box::new(item))),
		]
	})
}

fn arb_list() -> impl Strategy<Value = Vec<Item>> {
	prop::collection::vec(arb_item(), 0..5).prop_map(dedupe)
}

/// Drops repeated keys from a sibling list, keeping the first.
fn dedupe(mut items: Vec<Item>) -> Vec<Item> {
	let mut seen = HashSet::new();
	for item in &mut items {
		if let Item::Element { key, .. } | Item::Group { key, .. } = item {
			if let Some(k) = *key {
				if !seen.insert(k) {
					*key = None;
				}
			}
		}
	}
	items
}

fn wrap(_: &mut Context<'_, MockEnv>, _: &(), children: &[Spec<MockEnv>]) -> Result<Rendered<MockEnv>> {
	Ok(Rendered::Spec(children.to_vec().into()))
}

fn to_spec(item: &Item) -> Spec<MockEnv> {
	match item {
		Item::Null => Spec::Null,
		Item::Text(text) => Spec::from(text.as_str()),
		Item::Element { tag, key, children } => {
			let mut spec = element(*tag).children(children.iter().map(to_spec));
			if let Some(key) = key {
				spec = spec.key(*key);
			}
			spec.into()
		}
		Item::Group { key, items } => Spec::fragment(key.map(Into::into), items.iter().map(to_spec)),
		Item::Wrap(inner) => ComponentSpec::from_fn(wrap, ()).child(to_spec(inner)).into(),
	}
}

fn to_html(item: &Item) -> String {
	match item {
		Item::Null => String::new(),
		Item::Text(text) => text.clone(),
		Item::Element { tag, children, .. } => format!("<{0}>{1}</{0}>", tag, children.iter().map(to_html).collect::<String>()),
		Item::Group { items, .. } => items.iter().map(to_html).collect(),
		Item::Wrap(inner) => to_html(inner),
	}
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(256))]

	#[test]
	fn renders_match_their_markup(renders in prop::collection::vec(arb_list(), 1..6)) {
		init_logging();
		let mut renderer = Renderer::new(MockEnv::default());
		let body = renderer.env().root();

		for items in &renders {
			let spec = || items.iter().map(to_spec).collect::<Vec<_>>();
			renderer.render(&body, spec()).unwrap();
			prop_assert_eq!(body.inner_html(), items.iter().map(to_html).collect::<String>());

			renderer.env().reset_counts();
			renderer.render(&body, spec()).unwrap();
			prop_assert_eq!(renderer.env().counts(), Counts::default());
		}
	}
}
