pub trait FloatEx: Copy {
    fn is_not_nan(&self) -> bool;
    fn approx_eq(self, other: Self, tolerance: Self) -> bool;
}

impl FloatEx for f32 {
    #[inline(always)]
    fn is_not_nan(&self) -> bool {
        !self.is_nan()
    }

    #[inline(always)]
    fn approx_eq(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() < tolerance
    }
}

impl FloatEx for f64 {
    #[inline(always)]
    fn is_not_nan(&self) -> bool {
        !self.is_nan()
    }

    #[inline(always)]
    fn approx_eq(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() < tolerance
    }
}
