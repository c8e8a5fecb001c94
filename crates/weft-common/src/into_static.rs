use std::collections::BTreeMap;

use smol_str::SmolStr;

/// Detach a value from whatever buffer it borrows from.
///
/// Identifiers parsed with `new()` borrow from their input. `into_static()`
/// copies any borrowed parts so the result can outlive that input.
pub trait IntoStatic: Sized {
    /// The owned form, usually `Self` with every lifetime set to `'static`.
    type Output: 'static;

    /// Convert into the owned form.
    fn into_static(self) -> Self::Output;
}

macro_rules! impl_into_static_for_owned {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoStatic for $ty {
                type Output = $ty;

                #[inline]
                fn into_static(self) -> Self::Output {
                    self
                }
            }
        )*
    };
}

impl_into_static_for_owned!(
    bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, String, SmolStr, bytes::Bytes,
);

impl<T: IntoStatic> IntoStatic for Option<T> {
    type Output = Option<T::Output>;

    fn into_static(self) -> Self::Output {
        self.map(IntoStatic::into_static)
    }
}

impl<T: IntoStatic> IntoStatic for Vec<T> {
    type Output = Vec<T::Output>;

    fn into_static(self) -> Self::Output {
        self.into_iter().map(IntoStatic::into_static).collect()
    }
}

impl<K, V> IntoStatic for BTreeMap<K, V>
where
    K: IntoStatic,
    K::Output: Ord,
    V: IntoStatic,
{
    type Output = BTreeMap<K::Output, V::Output>;

    fn into_static(self) -> Self::Output {
        self.into_iter()
            .map(|(k, v)| (k.into_static(), v.into_static()))
            .collect()
    }
}
