//! Operator plumbing for transparent numeric newtypes.
//!
//! A tuple newtype over an integer gets its arithmetic by delegating to the
//! inner value. Spelling each impl out by hand is noise, so `op!` generates
//! them. Three arm forms are supported:
//!
//! * `op!(binary T, Add, add)`: `T op T -> T`
//! * `op!(inplace T, AddAssign, add_assign)`: `T op= T`
//! * `op!(unary T, Neg, neg)`: `op T -> T`

#[macro_export]
macro_rules! op {
    (binary $newtype:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $newtype {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0, rhs.0))
            }
        }
    };
    (inplace $newtype:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $newtype {
            fn $method(&mut self, rhs: Self) {
                std::ops::$trait::$method(&mut self.0, rhs.0);
            }
        }
    };
    (unary $newtype:ty, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $newtype {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0))
            }
        }
    };
}
