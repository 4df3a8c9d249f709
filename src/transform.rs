use glam::{Mat4, Vec3};

/// Matrix stack implementing hierarchical transform composition.
///
/// The stack owns a working matrix that composition operations mutate in
/// place by right-multiplication, so child transforms are always expressed
/// in the parent's local frame.  `push` snapshots the working matrix and
/// `pop` restores it; every push must be balanced by exactly one pop before
/// a traversal ends.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    current: Mat4,
    saved: Vec<Mat4>,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    /// Creates a stack whose working matrix is the identity.
    pub fn new() -> Self {
        Self {
            current: Mat4::IDENTITY,
            saved: Vec::new(),
        }
    }

    /// Creates a stack whose working matrix starts at `base`.
    pub fn with_base(base: Mat4) -> Self {
        Self {
            current: base,
            saved: Vec::new(),
        }
    }

    /// Returns the working matrix.
    pub fn current(&self) -> Mat4 {
        self.current
    }

    /// Number of saved snapshots.  Zero after any balanced traversal.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Saves a copy of the working matrix.  Later edits to the working
    /// matrix never touch the saved snapshot.
    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restores the working matrix from the most recent snapshot.
    ///
    /// Panics if the stack is empty; an unbalanced pop is a programming
    /// error in the traversal, not a recoverable condition.
    pub fn pop(&mut self) {
        self.current = self
            .saved
            .pop()
            .expect("matrix stack underflow: pop without matching push");
    }

    /// Right-multiplies a translation onto the working matrix.
    pub fn translate(&mut self, offset: Vec3) {
        self.current *= Mat4::from_translation(offset);
    }

    /// Right-multiplies a rotation of `angle` radians about `axis` onto the
    /// working matrix.  The axis does not need to be unit length.
    pub fn rotate(&mut self, angle: f32, axis: Vec3) {
        self.current *= Mat4::from_axis_angle(axis.normalize(), angle);
    }

    /// Right-multiplies a non-uniform scale onto the working matrix.
    pub fn scale(&mut self, factors: Vec3) {
        self.current *= Mat4::from_scale(factors);
    }

    /// Right-multiplies an arbitrary matrix onto the working matrix.
    pub fn apply(&mut self, matrix: Mat4) {
        self.current *= matrix;
    }
}
