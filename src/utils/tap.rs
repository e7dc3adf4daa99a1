pub trait TryTap: Sized {
    fn try_tap<F, E>(self, f: F) -> Result<Self, E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
    {
        f(&self)?;
        Ok(self)
    }
}

impl<T> TryTap for T {}
