/// Construct a [`Value`][crate::Value] using a JSON like syntax.
///
/// Object keys can be identifiers or string literals. `nil` produces
/// [`Value::Nil`][crate::Value::Nil] and any other expression is converted
/// using the `From` implementations of `Value`.
///
/// ```
/// let data = tincture::value! {
///     user: { name: "John Smith", age: 42 },
///     "tags": ["a", "b", nil],
/// };
/// # let _ = data;
/// ```
#[macro_export]
macro_rules! value {
    (nil) => {
        $crate::Value::Nil
    };

    ([ $($tt:tt)* ]) => {
        $crate::Value::Array($crate::__value_array!([] $($tt)*))
    };

    ({ $($tt:tt)* }) => {{
        #[allow(unused_mut)]
        let mut object = $crate::Map::new();
        $crate::__value_object!(object; $($tt)*);
        $crate::Value::Object(object)
    }};

    // A bare list of entries is treated as an object.
    ($key:tt : $($rest:tt)*) => {
        $crate::value!({ $key : $($rest)* })
    };

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

/// Accumulates array elements into `[...]` and finally produces a `Vec`.
#[macro_export]
#[doc(hidden)]
macro_rules! __value_array {
    ([$($out:expr,)*]) => {
        ::std::vec![$($out,)*]
    };

    ([$($out:expr,)*] nil $(, $($rest:tt)*)?) => {
        $crate::__value_array!([$($out,)* $crate::Value::Nil,] $($($rest)*)?)
    };

    ([$($out:expr,)*] [$($array:tt)*] $(, $($rest:tt)*)?) => {
        $crate::__value_array!([$($out,)* $crate::value!([$($array)*]),] $($($rest)*)?)
    };

    ([$($out:expr,)*] {$($object:tt)*} $(, $($rest:tt)*)?) => {
        $crate::__value_array!([$($out,)* $crate::value!({$($object)*}),] $($($rest)*)?)
    };

    ([$($out:expr,)*] $next:expr $(, $($rest:tt)*)?) => {
        $crate::__value_array!([$($out,)* $crate::Value::from($next),] $($($rest)*)?)
    };
}

/// Inserts `key: value` entries into the map named by the first argument.
#[macro_export]
#[doc(hidden)]
macro_rules! __value_object {
    ($map:ident;) => {};

    ($map:ident; $key:tt : nil $(, $($rest:tt)*)?) => {
        $map.insert($crate::__value_key!($key).into(), $crate::Value::Nil);
        $crate::__value_object!($map; $($($rest)*)?);
    };

    ($map:ident; $key:tt : [$($array:tt)*] $(, $($rest:tt)*)?) => {
        $map.insert($crate::__value_key!($key).into(), $crate::value!([$($array)*]));
        $crate::__value_object!($map; $($($rest)*)?);
    };

    ($map:ident; $key:tt : {$($object:tt)*} $(, $($rest:tt)*)?) => {
        $map.insert($crate::__value_key!($key).into(), $crate::value!({$($object)*}));
        $crate::__value_object!($map; $($($rest)*)?);
    };

    ($map:ident; $key:tt : $value:expr $(, $($rest:tt)*)?) => {
        $map.insert($crate::__value_key!($key).into(), $crate::Value::from($value));
        $crate::__value_object!($map; $($($rest)*)?);
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __value_key {
    ($key:ident) => {
        stringify!($key)
    };
    ($key:literal) => {
        $key
    };
}

#[cfg(test)]
mod tests {
    use crate::{Map, Value};

    #[test]
    fn value_nil() {
        assert_eq!(value!(nil), Value::Nil);
    }

    #[test]
    fn value_scalar() {
        assert_eq!(value!("testing..."), Value::from("testing..."));
        assert_eq!(value!(-3), Value::Integer(-3));
    }

    #[test]
    fn value_array() {
        let v = value!(["testing...", nil, {}, [], 1 + 1]);
        assert_eq!(
            v,
            Value::Array(vec![
                Value::from("testing..."),
                Value::Nil,
                Value::Object(Map::new()),
                Value::Array(Vec::new()),
                Value::Integer(2),
            ])
        );
    }

    #[test]
    fn value_object_keeps_order() {
        let v = value!({ z: 1, "a b": nil, m: [true] });
        let Value::Object(map) = v else {
            panic!("expected object");
        };
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a b", "m"]);
        assert_eq!(map["m"], Value::Array(vec![Value::Bool(true)]));
    }

    #[test]
    fn value_object_nested_trailing_comma() {
        let v = value! {
            user: {
                name: String::from("John"),
                age: 42,
            },
        };
        let exp = Value::from([(
            "user",
            Value::from([("name", Value::from("John")), ("age", Value::from(42))]),
        )]);
        assert_eq!(v, exp);
    }
}
