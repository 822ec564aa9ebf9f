use paste::paste;

macro_rules! impl_newtype_operator {
    { $newtype: ty, $operator: ident, $fn_name: ident, $operand: ty } => {
        paste! {
            impl ::core::ops::$operator < $operand > for $newtype {
                type Output = Self;
                fn $fn_name(self, rhs: $operand) -> Self::Output {
                    Self(<$operand as ::core::ops::$operator>::$fn_name(self.0, rhs))
                }
            }
            impl ::core::ops::[<$operator Assign>] < $operand > for $newtype {
                fn [<$fn_name _assign>](&mut self, rhs: $operand) {
                    self.0 = <$operand as ::core::ops::$operator>::$fn_name(self.0, rhs);
                }
            }
        }
    };
}
macro_rules! impl_newtype_operators {
    { $newtype: ty, $inner_ty: ty } => {
        impl_newtype_operator! { $newtype, Add, add, $inner_ty }
        impl_newtype_operator! { $newtype, Sub, sub, $inner_ty }
        impl_newtype_operator! { $newtype, Shr, shr, $inner_ty }
        impl_newtype_operator! { $newtype, Shl, shl, $inner_ty }
        impl_newtype_operator! { $newtype, BitAnd, bitand, $inner_ty }
        impl_newtype_operator! { $newtype, BitOr, bitor, $inner_ty }
    };
}

/// a physical memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PhysAddr(pub usize);
impl_newtype_operators! { PhysAddr, usize }
impl PhysAddr {
    /// creates a new physical address with the given value.
    pub const fn new(value: usize) -> Self {
        Self(value)
    }
}

/// a virtual memory address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VirtAddr(pub usize);
impl_newtype_operators! { VirtAddr, usize }
impl VirtAddr {
    /// creates a new virtual address with the given value.
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// converts this virtual address to a pointer.
    pub const fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    /// converts this virtual address to a mutable pointer.
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}
