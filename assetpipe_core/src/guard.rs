use std::fmt;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::PipelineError;
use crate::PipelineResult;

static ACTIVE_RENDER: Mutex<Option<PipelineId>> = Mutex::new(None);

/// Identifies a pipeline for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(u64);

impl PipelineId {
	pub(crate) fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for PipelineId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "pipeline#{}", self.0)
	}
}

/// Exclusive claim on the process-wide render slot.
///
/// Only one render can be active at a time. The slot is released when the
/// guard is dropped, whether the render returned normally, failed, or
/// panicked.
#[derive(Debug)]
#[must_use = "the render slot is released as soon as the guard is dropped"]
pub struct RenderGuard {
	id: PipelineId,
}

impl RenderGuard {
	/// Claim the render slot for `id`, failing with
	/// [`PipelineError::Reentrancy`] when any pipeline already holds it.
	pub fn acquire(id: PipelineId) -> PipelineResult<Self> {
		let mut active = ACTIVE_RENDER.lock().unwrap_or_else(PoisonError::into_inner);

		if let Some(current) = *active {
			tracing::debug!(requested = %id, %current, "render already active");
			return Err(PipelineError::Reentrancy);
		}

		*active = Some(id);
		Ok(Self { id })
	}

	pub fn id(&self) -> PipelineId {
		self.id
	}
}

impl Drop for RenderGuard {
	fn drop(&mut self) {
		let mut active = ACTIVE_RENDER.lock().unwrap_or_else(PoisonError::into_inner);
		if *active == Some(self.id) {
			*active = None;
		}
	}
}

/// The pipeline currently rendering, or [`PipelineError::NoActiveRender`] when
/// the process is idle.
pub fn current_render() -> PipelineResult<PipelineId> {
	let active = *ACTIVE_RENDER.lock().unwrap_or_else(PoisonError::into_inner);
	active.ok_or(PipelineError::NoActiveRender)
}

pub fn is_render_active() -> bool {
	current_render().is_ok()
}
