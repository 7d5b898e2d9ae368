//! Layout implementations for attribute tuples.

use super::{offset_at, Attribute, AttributeFormat, AttributeLayout, Field};

// One `Field<N>` impl per position. The generic list travels as a single
// bracketed token tree so it can be repeated once per field.
macro_rules! impl_field {
    ([$($generic:ident),+] $tuple:ty, $index:literal, $attr:ident) => {
        impl<$($generic: Attribute),+> Field<$index> for $tuple {
            type Attr = $attr;
            const OFFSET: usize = offset_at(<$tuple as AttributeLayout>::FORMATS, $index);
        }
    };
}

macro_rules! impl_fields {
    ($generics:tt $tuple:ty ;) => {};
    ($generics:tt $tuple:ty ; $index:literal => $attr:ident $(, $rest_index:literal => $rest_attr:ident)*) => {
        impl_field!($generics $tuple, $index, $attr);
        impl_fields!($generics $tuple ; $($rest_index => $rest_attr),*);
    };
}

macro_rules! impl_layout {
    ($($index:literal => $ty:ident),+) => {
        impl<$($ty: Attribute),+> AttributeLayout for ($($ty,)+) {
            const FORMATS: &'static [AttributeFormat] = &[$($ty::FORMAT),+];
        }

        impl_fields!([$($ty),+] ($($ty,)+) ; $($index => $ty),+);
    };
}

impl_layout!(0 => A);
impl_layout!(0 => A, 1 => B);
impl_layout!(0 => A, 1 => B, 2 => C);
impl_layout!(0 => A, 1 => B, 2 => C, 3 => D);
impl_layout!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
impl_layout!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);
impl_layout!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G);
impl_layout!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H);

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3, Vec4};

    #[test]
    fn test_formats_follow_declaration_order() {
        assert_eq!(
            <(f32, Vec2) as AttributeLayout>::FORMATS,
            &[AttributeFormat::Float, AttributeFormat::Float2]
        );
        assert_eq!(<(Vec4,) as AttributeLayout>::STRIDE, 16);
    }

    #[test]
    fn test_field_types() {
        fn same<T: 'static, U: 'static>() -> bool {
            std::any::TypeId::of::<T>() == std::any::TypeId::of::<U>()
        }
        assert!(same::<<(Vec3, i32, Vec2) as Field<1>>::Attr, i32>());
        assert!(same::<<(Vec3, i32, Vec2) as Field<2>>::Attr, Vec2>());
        assert_eq!(<(Vec3, i32, Vec2) as Field<2>>::OFFSET, 16);
    }
}
