/// Build a `SpookyValue::Object` from a nested literal.
///
/// ```
/// use spooky_dict::spooky_obj;
///
/// let user = spooky_obj!({
///     "name" => "Alice",
///     "age" => 28i64,
///     "tags" => ["dev", "rust"],
///     "address" => { "city" => "Berlin" },
/// });
/// let dict = user.as_object().unwrap();
/// assert_eq!(dict.get_typed("address.city", String::new()), "Berlin");
/// ```
#[macro_export]
macro_rules! spooky_obj {
    // Nested objects
    (@value { $($inner:tt)* }) => {
        $crate::spooky_obj!({ $($inner)* })
    };

    // Sequences
    (@value [ $($item:tt),* $(,)? ]) => {
        $crate::SpookyValue::from(vec![ $( $crate::spooky_obj!(@value $item) ),* ])
    };

    // Literals or ready-made values
    (@value $val:expr) => {
        $crate::SpookyValue::from($val)
    };

    ({ $($key:expr => $val:tt),* $(,)? }) => {{
        let dict = $crate::SpookyDict::new();
        $(
            dict.set_member($key, $crate::spooky_obj!(@value $val));
        )*
        $crate::SpookyValue::Object(dict)
    }};
}

/// Declare a fieldless enum that typed reads can produce from a variant
/// name (case-insensitive) or from its discriminant.
///
/// ```
/// use spooky_dict::{SpookyDict, spooky_enum};
///
/// spooky_enum! {
///     pub enum Role { Guest, Member = 5, Admin }
/// }
///
/// let dict = SpookyDict::new();
/// dict.set_member("role", "admin");
/// dict.set_member("fallback", 5i64);
/// assert_eq!(dict.get_typed("role", Role::Guest), Role::Admin);
/// assert_eq!(dict.get_typed("fallback", Role::Guest), Role::Member);
/// ```
#[macro_export]
macro_rules! spooky_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident $(= $disc:expr)? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant $(= $disc)? ),*
        }

        impl $crate::coerce::SpookyEnum for $name {
            const NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [(&'static str, Self)] =
                &[ $( (stringify!($variant), $name::$variant) ),* ];

            #[inline]
            fn discriminant(self) -> i64 {
                self as i64
            }
        }

        impl $crate::coerce::FromSpooky for $name {
            fn from_spooky(
                value: &$crate::SpookyValue,
                _: &$crate::ResolverChain,
            ) -> ::std::result::Result<Self, $crate::ConversionError> {
                $crate::coerce::enum_from_value::<Self>(value)
            }
        }

        impl ::std::convert::From<$name> for $crate::SpookyValue {
            fn from(v: $name) -> Self {
                $crate::SpookyValue::from(<$name as $crate::coerce::SpookyEnum>::name(v))
            }
        }
    };
}

/// Declare a named view over a `SpookyDict` with typed getters.
///
/// Each field becomes a getter returning `Option<T>` through
/// `try_get_typed`. The key defaults to the field name; `=> "path"`
/// overrides it with any path expression.
///
/// ```
/// use spooky_dict::{SpookyDict, spooky_record_type};
///
/// spooky_record_type! {
///     pub struct User {
///         name: String,
///         age: u32,
///         city: String => "address.city",
///     }
/// }
///
/// let user = User::new();
/// user.set("name", "Bob").unwrap();
/// user.set("age", "41").unwrap();
/// user.set("address.city", "Oslo").unwrap();
/// assert_eq!(user.name().as_deref(), Some("Bob"));
/// assert_eq!(user.age(), Some(41));
/// assert_eq!(user.city().as_deref(), Some("Oslo"));
///
/// let plain = SpookyDict::new();
/// plain.set_member("NAME", "Eve");
/// plain.set_member("holder", plain.clone_record(false));
/// let eve: User = plain.get_typed("holder", User::new());
/// assert_eq!(eve.name().as_deref(), Some("Eve"));
/// ```
#[macro_export]
macro_rules! spooky_record_type {
    (@key $field:ident) => {
        stringify!($field)
    };
    (@key $field:ident $key:literal) => {
        $key
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty $(=> $key:literal)? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name($crate::SpookyDict);

        impl $name {
            /// An empty record on the global resolver chain.
            pub fn new() -> Self {
                $name($crate::SpookyDict::new())
            }

            pub fn into_dict(self) -> $crate::SpookyDict {
                self.0
            }

            $(
                $(#[$fmeta])*
                pub fn $field(&self) -> ::std::option::Option<$ty> {
                    self.0
                        .try_get_typed::<$ty>($crate::spooky_record_type!(@key $field $($key)?))
                        .ok()
                }
            )*
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $crate::coerce::SpookyRecordType for $name {
            fn from_dict(dict: $crate::SpookyDict) -> Self {
                $name(dict)
            }

            fn as_dict(&self) -> &$crate::SpookyDict {
                &self.0
            }
        }

        impl $crate::coerce::FromSpooky for $name {
            fn from_spooky(
                value: &$crate::SpookyValue,
                _: &$crate::ResolverChain,
            ) -> ::std::result::Result<Self, $crate::ConversionError> {
                $crate::coerce::record_from_value::<Self>(value, stringify!($name))
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::SpookyDict;

            fn deref(&self) -> &$crate::SpookyDict {
                &self.0
            }
        }

        impl ::std::convert::From<$name> for $crate::SpookyValue {
            fn from(record: $name) -> Self {
                $crate::SpookyValue::Object(record.0)
            }
        }
    };
}
