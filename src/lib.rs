#![doc(html_root_url = "https://docs.rs/malevich-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A small declarative UI reconciler.
//!
//! Immutable [`Spec`] trees are diffed against the previous pass and applied to a live resource tree
//! through an [`Environment`], touching only what changed.
//!
//! See [`Renderer`] for the entry points.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod arena;
mod diff;
mod links;
mod matcher;
mod node;

pub mod component;
pub mod environment;
pub mod error;
pub mod plugins;
pub mod render;
pub mod spec;

#[cfg(feature = "web")]
mod listener_callbacks;
#[cfg(feature = "web")]
pub mod web;

pub use component::{Context, Handle, Store};
pub use environment::{Environment, Listener};
pub use error::{Error, Result};
pub use plugins::PluginSet;
pub use render::{Config, Renderer};
pub use spec::{element, AttrValue, Component, ComponentSpec, ElementSpec, Key, Rendered, Spec};
