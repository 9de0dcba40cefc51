// ============================================================================
// spark-fiber - Errors
// ============================================================================

use thiserror::Error;

/// Why a render pass was aborted.
///
/// An aborted pass leaves the committed tree untouched; the error is kept on
/// the root until [`Root::take_error`](crate::Root::take_error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("component `{component}` failed to render: {message}")]
    Component {
        component: &'static str,
        message: String,
    },
}

impl RenderError {
    pub fn component(component: &'static str, message: impl Into<String>) -> Self {
        RenderError::Component {
            component,
            message: message.into(),
        }
    }
}

/// Misuse of hooks. These are programming errors and are raised as panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("rendered more hooks than during the previous render (previous: {previous})")]
    MoreHooks { previous: usize },

    #[error(
        "rendered fewer hooks than expected ({rendered} of {previous}); \
         this may be caused by an accidental early return"
    )]
    FewerHooks { rendered: usize, previous: usize },

    #[error("hook #{index} changed between renders: expected {expected}, found {found}")]
    KindMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}
