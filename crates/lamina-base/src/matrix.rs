use crate::{GemmError, Result};

/// Whether an operand is stored as given or transposed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transpose {
    NoTrans,
    Trans,
}

impl Transpose {
    #[inline]
    pub fn is_trans(self) -> bool {
        self == Transpose::Trans
    }

    /// Stored (rows, cols) of an operand whose logical shape is `rows x cols`.
    #[inline]
    pub fn stored_dims(self, rows: usize, cols: usize) -> (usize, usize) {
        match self {
            Transpose::NoTrans => (rows, cols),
            Transpose::Trans => (cols, rows),
        }
    }
}

impl From<bool> for Transpose {
    fn from(trans: bool) -> Self {
        if trans {
            Transpose::Trans
        } else {
            Transpose::NoTrans
        }
    }
}

/// Number of elements a row-major `rows x cols` view with leading dimension `ld`
/// spans, `None` when that does not fit in `usize`.
#[inline]
pub fn required_len(rows: usize, cols: usize, ld: usize) -> Option<usize> {
    if rows == 0 || cols == 0 {
        Some(0)
    } else {
        (rows - 1).checked_mul(ld)?.checked_add(cols)
    }
}

fn check_view(operand: &'static str, len: usize, rows: usize, cols: usize, ld: usize) -> Result<()> {
    let min = cols.max(1);
    if ld < min {
        return Err(GemmError::InvalidLeadingDimension { operand, ld, min });
    }
    let required = required_len(rows, cols, ld).ok_or(GemmError::SizeOverflow { operand })?;
    if len < required {
        return Err(GemmError::BufferTooSmall { operand, len, required });
    }
    Ok(())
}

/// Read-only row-major view over caller-owned `f32` storage.
#[derive(Copy, Clone, Debug)]
pub struct MatrixRef<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
    ld: usize,
}

impl<'a> MatrixRef<'a> {
    pub fn new(data: &'a [f32], rows: usize, cols: usize, ld: usize) -> Result<Self> {
        Self::for_operand("matrix", data, rows, cols, ld)
    }

    /// Same as [`MatrixRef::new`], naming the operand in errors.
    pub fn for_operand(operand: &'static str, data: &'a [f32], rows: usize, cols: usize, ld: usize) -> Result<Self> {
        check_view(operand, data.len(), rows, cols, ld)?;
        Ok(Self { data, rows, cols, ld })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn ld(&self) -> usize {
        self.ld
    }
    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }
}

/// Mutable row-major view over caller-owned `f32` storage.
#[derive(Debug)]
pub struct MatrixMut<'a> {
    data: &'a mut [f32],
    rows: usize,
    cols: usize,
    ld: usize,
}

impl<'a> MatrixMut<'a> {
    pub fn new(data: &'a mut [f32], rows: usize, cols: usize, ld: usize) -> Result<Self> {
        Self::for_operand("matrix", data, rows, cols, ld)
    }

    pub fn for_operand(operand: &'static str, data: &'a mut [f32], rows: usize, cols: usize, ld: usize) -> Result<Self> {
        check_view(operand, data.len(), rows, cols, ld)?;
        Ok(Self { data, rows, cols, ld })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn ld(&self) -> usize {
        self.ld
    }
    pub fn as_mut_ptr(&mut self) -> *mut f32 {
        self.data.as_mut_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_checks() {
        let data = vec![0.0f32; 10];
        assert!(MatrixRef::new(&data, 2, 4, 6).is_ok());
        // (2-1)*6 + 5 = 11 > 10
        assert!(matches!(
            MatrixRef::new(&data, 2, 5, 6),
            Err(GemmError::BufferTooSmall { required: 11, len: 10, .. })
        ));
        assert!(matches!(
            MatrixRef::for_operand("A", &data, 2, 4, 3),
            Err(GemmError::InvalidLeadingDimension { operand: "A", ld: 3, min: 4 })
        ));
        // empty views need no storage but still a sane ld
        assert!(MatrixRef::new(&[], 0, 4, 4).is_ok());
        assert!(MatrixRef::new(&[], 3, 0, 0).is_err());
    }

    #[test]
    fn stored_dims() {
        assert_eq!(Transpose::NoTrans.stored_dims(3, 5), (3, 5));
        assert_eq!(Transpose::Trans.stored_dims(3, 5), (5, 3));
        assert_eq!(Transpose::from(true), Transpose::Trans);
    }

    #[test]
    fn wrapping_extent_rejected() {
        // (2-1)*usize::MAX + 1 wraps to 0
        assert_eq!(required_len(2, 1, usize::MAX), None);
        assert_eq!(required_len(1, 5, usize::MAX), Some(5));
        assert_eq!(required_len(0, 5, usize::MAX), Some(0));
        assert!(matches!(
            MatrixRef::for_operand("A", &[], 2, 1, usize::MAX),
            Err(GemmError::SizeOverflow { operand: "A" })
        ));
        let mut data = [0.0f32; 4];
        assert!(matches!(
            MatrixMut::for_operand("C", &mut data, usize::MAX, 2, 2),
            Err(GemmError::SizeOverflow { operand: "C" })
        ));
    }

    #[test]
    fn accessors() {
        let data: Vec<f32> = (0..12).map(|x| x as f32).collect();
        let a = MatrixRef::new(&data, 3, 3, 4).unwrap();
        assert_eq!((a.rows(), a.cols(), a.ld()), (3, 3, 4));
        assert_eq!(a.as_ptr(), data.as_ptr());
        let mut data = data;
        let ptr = data.as_mut_ptr();
        let mut c = MatrixMut::new(&mut data, 2, 2, 6).unwrap();
        assert_eq!((c.rows(), c.cols(), c.ld()), (2, 2, 6));
        assert_eq!(c.as_mut_ptr(), ptr);
    }
}
