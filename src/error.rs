use crate::spec::Key;
use thiserror::Error;

/// Reconciliation failures.
///
/// All of these abort the current pass where they are detected and are returned unchanged from
/// [`Renderer::render`](`crate::Renderer::render`), [`Renderer::sync`](`crate::Renderer::sync`) or the refresh that triggered them.
///
/// There is no rollback: Link/Hub bookkeeping and the live resource tree are left as they were at the point of failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// A specification value that can't be classified, for example an element with an invalid tag name.
	#[error("Unsupported specification: {0}")]
	UnsupportedSpec(String),

	/// Two new siblings were declared with the same explicit key.
	#[error("Duplicate key among siblings: {0}")]
	DuplicateKey(Key),

	/// A refresh or state update was requested while it would restart a render that is still running.
	#[error("`{component}` requested a refresh from within a running render pass")]
	InfiniteLoop {
		/// Type name of the component that tried to refresh.
		component: &'static str,
	},

	/// [`Renderer::sync`](`crate::Renderer::sync`) resolved to something other than exactly the given resource.
	#[error("Specification did not resolve to the synchronised resource: {0}")]
	SpecMismatch(String),

	/// The dispatcher recursed deeper than [`Config::depth_limit`](`crate::Config::depth_limit`).
	#[error("Depth limit of {0} reached")]
	DepthLimitExceeded(usize),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
