//! The `define_index_types` macro.

/// Defines types that consist of a single dense `usize` index into one of the
/// `Grid`'s entity tables.
///
/// A grid's entity counts depend on its dimensions, so these types carry no
/// compile-time count: the grid that handed out an id is the authority on
/// whether it's in range.
#[macro_export]
macro_rules! define_index_types {
    (
        $(
            $(#[$outer:meta])*
            $type_name:ident;
        )*
    ) => {
        $(
            $crate::define_index_types!(
                @nested $(#[$outer])* $type_name,
                concat!("Makes a new `", stringify!($type_name),
                    "` wrapping the given index.  Callers must ensure the index is ",
                    "valid for the grid they use it with."),
                concat!("Returns this `", stringify!($type_name),
                    "`'s index, suitable for indexing the grid's tables.")
            );
        )*
    };
    (
        @nested
        $(#[$outer:meta])*
        $type_name:ident,
        $new_doc:expr,
        $index_doc:expr
    ) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        $(#[$outer])*
        pub struct $type_name(usize);

        impl $type_name {
            #[doc = $new_doc]
            pub const fn new(index: usize) -> Self {
                $type_name(index)
            }

            #[doc = $index_doc]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<$type_name> for usize {
            #[doc = $index_doc]
            fn from(id: $type_name) -> Self {
                id.index()
            }
        }

        impl std::fmt::Display for $type_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", &stringify!($type_name)[..1], self.0)
            }
        }
    };
}
