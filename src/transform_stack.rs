//! Hierarchical model-view matrices with scoped push/pop.
//!
//! The stack starts every frame at the view matrix. Each drawable opens a
//! [`TransformScope`] with [`TransformStack::push`], composes its local
//! transforms on top, uploads [`TransformStack::current`], and lets the scope
//! drop. Dropping the scope restores the parent transform, so a sibling can
//! never inherit a transform its predecessor forgot to pop.
//!
//! ```
//! use lightbox::TransformStack;
//! use glam::{Mat4, Vec3};
//!
//! let mut stack = TransformStack::new();
//! {
//!     let mut ground = stack.push();
//!     ground.translate(Vec3::new(0.0, -0.05, 0.0)).scale(Vec3::new(3.0, 0.1, 3.0));
//!     assert_ne!(ground.current(), Mat4::IDENTITY);
//! }
//! assert_eq!(stack.current(), Mat4::IDENTITY);
//! ```
//!
//! Every composition post-multiplies the top: `top = top * T`. Reading a chain
//! of calls top to bottom therefore reads from the outermost frame inward.

use std::ops::{Deref, DerefMut};

use glam::{Mat4, Vec3};

/// Misuse of the transform stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    /// A pop would have removed the base transform.
    #[error("pop would remove the base transform")]
    Underflow,
    /// The frame ended with pushes still open.
    #[error("transform stack left at depth {depth} at end of frame, expected 1")]
    Unbalanced { depth: usize },
}

/// A stack of 4×4 model-view matrices; never empty.
#[derive(Clone, Debug)]
pub struct TransformStack {
    stack: Vec<Mat4>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self {
            stack: vec![Mat4::IDENTITY],
        }
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every entry and starts over from `base`.
    pub fn reset(&mut self, base: Mat4) {
        self.stack.clear();
        self.stack.push(base);
    }

    /// Duplicates the top and returns a scope that pops it again on drop.
    pub fn push(&mut self) -> TransformScope<'_> {
        let top = self.current();
        self.stack.push(top);
        let depth = self.stack.len();
        TransformScope { stack: self, depth }
    }

    /// Removes the top entry and returns it.
    ///
    /// Prefer [`push`](Self::push) scopes; this exists for callers that
    /// manage nesting themselves.
    pub fn pop(&mut self) -> Result<Mat4, StackError> {
        if self.stack.len() <= 1 {
            return Err(StackError::Underflow);
        }
        self.stack.pop().ok_or(StackError::Underflow)
    }

    /// The current composite transform.
    pub fn current(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Number of entries, including the base.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Checks that every push of the frame has been matched.
    pub fn finish(&self) -> Result<(), StackError> {
        match self.stack.len() {
            1 => Ok(()),
            depth => Err(StackError::Unbalanced { depth }),
        }
    }

    /// Replaces the top with `top * matrix`.
    pub fn multiply(&mut self, matrix: Mat4) -> &mut Self {
        if let Some(top) = self.stack.last_mut() {
            *top *= matrix;
        }
        self
    }

    pub fn translate(&mut self, offset: Vec3) -> &mut Self {
        self.multiply(Mat4::from_translation(offset))
    }

    pub fn scale(&mut self, factors: Vec3) -> &mut Self {
        self.multiply(Mat4::from_scale(factors))
    }

    /// Rotates about an arbitrary axis. The axis does not need to be normalized
    /// but must not be zero.
    pub fn rotate(&mut self, axis: Vec3, degrees: f32) -> &mut Self {
        self.multiply(Mat4::from_axis_angle(axis.normalize(), degrees.to_radians()))
    }

    pub fn rotate_y(&mut self, degrees: f32) -> &mut Self {
        self.rotate(Vec3::Y, degrees)
    }
}

/// An open push on a [`TransformStack`].
///
/// Derefs to the stack, so compositions and nested pushes go through it.
/// Dropping it truncates the stack back to the depth it had before the push,
/// which also discards anything a nested scope leaked.
pub struct TransformScope<'a> {
    stack: &'a mut TransformStack,
    depth: usize,
}

impl Deref for TransformScope<'_> {
    type Target = TransformStack;

    fn deref(&self) -> &TransformStack {
        self.stack
    }
}

impl DerefMut for TransformScope<'_> {
    fn deref_mut(&mut self) -> &mut TransformStack {
        self.stack
    }
}

impl Drop for TransformScope<'_> {
    fn drop(&mut self) {
        self.stack.stack.truncate(self.depth - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> Mat4 {
        Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn scope_restores_previous_top() {
        let mut stack = TransformStack::new();
        stack.reset(view());
        {
            let mut scope = stack.push();
            scope
                .translate(Vec3::new(1.0, 2.0, 3.0))
                .scale(Vec3::new(2.0, 0.5, 2.0))
                .rotate_y(30.0);
            assert_eq!(scope.depth(), 2);
        }
        assert_eq!(stack.current(), view());
        assert_eq!(stack.depth(), 1);
        assert!(stack.finish().is_ok());
    }

    #[test]
    fn nested_scopes_unwind_in_order() {
        let mut stack = TransformStack::new();
        let mut outer = stack.push();
        outer.translate(Vec3::X);
        let outer_top = outer.current();
        {
            let mut inner = outer.push();
            inner.rotate(Vec3::Z, 90.0);
            assert_eq!(inner.depth(), 3);
        }
        assert_eq!(outer.current(), outer_top);
        drop(outer);
        assert_eq!(stack.current(), Mat4::IDENTITY);
    }

    #[test]
    fn compositions_post_multiply() {
        let mut stack = TransformStack::new();
        stack
            .translate(Vec3::new(0.0, 1.0, 0.0))
            .scale(Vec3::splat(2.0));
        // Scale applies first, then the translation.
        let point = stack.current().transform_point3(Vec3::X);
        assert!(point.abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn rotate_y_matches_axis_rotation() {
        let mut a = TransformStack::new();
        let mut b = TransformStack::new();
        a.rotate_y(45.0);
        b.rotate(Vec3::new(0.0, 3.0, 0.0), 45.0);
        assert!(a.current().abs_diff_eq(b.current(), 1e-6));
    }

    #[test]
    fn pop_below_base_is_an_error() {
        let mut stack = TransformStack::new();
        assert_eq!(stack.pop(), Err(StackError::Underflow));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn manual_push_pop_round_trips() {
        let mut stack = TransformStack::new();
        stack.reset(view());
        std::mem::forget(stack.push());
        stack.translate(Vec3::ONE);
        assert!(stack.pop().is_ok());
        assert_eq!(stack.current(), view());
    }

    #[test]
    fn leaked_push_is_reported_at_frame_end() {
        let mut stack = TransformStack::new();
        std::mem::forget(stack.push());
        assert_eq!(stack.finish(), Err(StackError::Unbalanced { depth: 2 }));
    }

    #[test]
    fn scope_cleans_up_leaked_inner_push() {
        let mut stack = TransformStack::new();
        {
            let mut outer = stack.push();
            std::mem::forget(outer.push());
            assert_eq!(outer.depth(), 3);
        }
        assert_eq!(stack.depth(), 1);
    }
}
