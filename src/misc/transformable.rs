use crate::error::Result;

/// A trait for objects that can be transformed by a given type.
/// A failed transform leaves the object untouched.
pub trait Transformable<T>: Clone {
    fn try_transform(&mut self, transform: T) -> Result<()>;

    fn try_transformed(&self, transform: T) -> Result<Self> {
        let mut clone = self.clone();
        clone.try_transform(transform)?;
        Ok(clone)
    }
}
