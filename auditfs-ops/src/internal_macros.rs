macro_rules! getters {
    ($($f:ident: $t:ty,)+) => {$(
        #[inline]
        #[must_use]
        pub const fn $f(&self) -> $t {
            self.$f
        }
    )+};
}

macro_rules! declare_operation {
    ($op:ident => $kind:ident, $reply:ty) => {
        impl crate::ops::Operation for $op<'_> {
            const KIND: crate::ops::OpKind = crate::ops::OpKind::$kind;
            type Reply = $reply;
        }
    };
}
