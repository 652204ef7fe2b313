/// Owned scratch holding one packed panel of A or B.
///
/// The capacity only grows; [`PackedBuffer::reserve`] is called with the
/// active plan's requirement before every use, so a buffer reused across
/// calls is always large enough. It never aliases a caller operand.
#[derive(Debug, Default, Clone)]
pub struct PackedBuffer {
    data: Vec<f32>,
}

impl PackedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zeroed buffer of exactly `len` floats.
    pub fn with_len(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    /// Grow to at least `len` floats.
    pub fn reserve(&mut self, len: usize) {
        if self.data.len() < len {
            self.data.resize(len, 0.0);
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut f32 {
        self.data.as_mut_ptr()
    }
}
