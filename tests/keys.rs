mod mock_env_;

use malevich_dom::{element, ComponentSpec, Context, ElementSpec, Error, Key, Renderer, Rendered, Result, Spec, Store};
use mock_env_::{init_logging, Counts, MockEnv, MockNode};

fn el(tag: &str) -> ElementSpec<MockEnv> {
	element(tag)
}

fn item(key: i64, text: &str) -> Spec<MockEnv> {
	el("li").key(key).child(text).into()
}

fn setup() -> (Renderer<MockEnv>, MockNode) {
	init_logging();
	let renderer = Renderer::new(MockEnv::default());
	let body = renderer.env().root();
	(renderer, body)
}

fn ids(node: &MockNode) -> Vec<usize> {
	node.children().iter().map(MockNode::id).collect()
}

#[test]
fn reversal_moves_instead_of_recreating() {
	let (mut renderer, body) = setup();
	renderer.render(&body, vec![item(1, "a"), item(2, "b"), item(3, "c")]).unwrap();
	let mut before = ids(&body);
	renderer.env().reset_counts();

	renderer.render(&body, vec![item(3, "c"), item(2, "b"), item(1, "a")]).unwrap();
	assert_eq!(body.inner_html(), "<li>c</li><li>b</li><li>a</li>");
	before.reverse();
	assert_eq!(ids(&body), before);
	assert_eq!(renderer.env().counts(), Counts { inserts: 2, ..Counts::default() });
}

#[test]
fn insertion_between_keyed_siblings() {
	let (mut renderer, body) = setup();
	renderer.render(&body, vec![item(1, "a"), item(3, "c")]).unwrap();
	let before = ids(&body);
	renderer.env().reset_counts();

	renderer.render(&body, vec![item(1, "a"), item(2, "b"), item(3, "c")]).unwrap();
	assert_eq!(body.inner_html(), "<li>a</li><li>b</li><li>c</li>");
	let after = ids(&body);
	assert_eq!((after[0], after[2]), (before[0], before[1]));
	assert_eq!(
		renderer.env().counts(),
		Counts {
			creates: 2,
			inserts: 2,
			..Counts::default()
		}
	);
}

#[test]
fn keyed_removal_at_the_front() {
	let (mut renderer, body) = setup();
	renderer.render(&body, vec![item(1, "a"), item(2, "b"), item(3, "c")]).unwrap();
	let before = ids(&body);
	renderer.env().reset_counts();

	renderer.render(&body, vec![item(2, "b"), item(3, "c")]).unwrap();
	assert_eq!(body.inner_html(), "<li>b</li><li>c</li>");
	assert_eq!(ids(&body), before[1..]);
	assert_eq!(renderer.env().counts(), Counts { removes: 1, ..Counts::default() });
}

#[test]
fn same_key_different_tag_recreates() {
	let (mut renderer, body) = setup();
	renderer.render(&body, el("li").key(1)).unwrap();
	renderer.env().reset_counts();

	renderer.render(&body, el("p").key(1)).unwrap();
	assert_eq!(body.inner_html(), "<p></p>");
	assert_eq!(
		renderer.env().counts(),
		Counts {
			creates: 1,
			inserts: 1,
			removes: 1,
			..Counts::default()
		}
	);
}

#[test]
fn duplicate_keys_are_rejected_before_any_change() {
	let (mut renderer, body) = setup();
	renderer.render(&body, vec![item(1, "a"), item(2, "b")]).unwrap();
	renderer.env().reset_counts();

	assert_eq!(renderer.render(&body, vec![item(1, "x"), item(1, "y")]), Err(Error::DuplicateKey(Key::Int(1))));
	assert_eq!(body.inner_html(), "<li>a</li><li>b</li>");
	assert_eq!(renderer.env().counts(), Counts::default());

	renderer.render(&body, vec![item(2, "b"), item(1, "a")]).unwrap();
	assert_eq!(body.inner_html(), "<li>b</li><li>a</li>");
	assert_eq!(renderer.env().counts().creates, 0);
}

#[test]
fn keyed_fragments_move_as_a_whole() {
	let (mut renderer, body) = setup();
	let group = |key: &str, items: &[&str]| Spec::<MockEnv>::fragment(Some(key.into()), items.iter().map(|&item| el("p").child(item)));

	renderer.render(&body, vec![group("a", &["a1", "a2"]), group("b", &["b1"])]).unwrap();
	let before = ids(&body);
	renderer.env().reset_counts();

	renderer.render(&body, vec![group("b", &["b1"]), group("a", &["a1", "a2"])]).unwrap();
	assert_eq!(body.inner_html(), "<p>b1</p><p>a1</p><p>a2</p>");
	assert_eq!(ids(&body), [before[2], before[0], before[1]]);
	assert_eq!(renderer.env().counts(), Counts { inserts: 1, ..Counts::default() });
}

fn row(cx: &mut Context<'_, MockEnv>, label: &&'static str, _: &[Spec<MockEnv>]) -> Result<Rendered<MockEnv>> {
	let first = cx.store_with(|| Store::new().with("first", *label)).get::<&'static str>("first").copied().unwrap_or_default();
	Ok(el("li").child(format!("{}:{}", first, label)).into())
}

#[test]
fn component_state_follows_keys() {
	let (mut renderer, body) = setup();
	let rows = |labels: &[&'static str]| labels.iter().map(|&label| Spec::from(ComponentSpec::from_fn(row, label).key(label))).collect::<Vec<_>>();

	renderer.render(&body, rows(&["a", "b"])).unwrap();
	renderer.render(&body, rows(&["b", "a"])).unwrap();
	assert_eq!(body.inner_html(), "<li>b:b</li><li>a:a</li>");
}

#[test]
fn unkeyed_component_state_follows_position() {
	let (mut renderer, body) = setup();
	let rows = |labels: &[&'static str]| labels.iter().map(|&label| Spec::from(ComponentSpec::from_fn(row, label))).collect::<Vec<_>>();

	renderer.render(&body, rows(&["a", "b"])).unwrap();
	renderer.render(&body, rows(&["b", "a"])).unwrap();
	assert_eq!(body.inner_html(), "<li>a:b</li><li>b:a</li>");
}
