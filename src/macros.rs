//! Macroses for mapping newtypes and enums to postgres columns.
//! The types themselves derive `FromSqlRow` and `AsExpression`,
//! these macroses add the `ToSql` / `FromSql` halves.

/// Maps a tuple newtype to the sql type of its single field.
#[macro_export]
macro_rules! newtype_sql_impls {
    ($name:ident, $inner:ty, $sql:ty) => {
        impl ::diesel::serialize::ToSql<$sql, ::diesel::pg::Pg> for $name {
            fn to_sql<W: ::std::io::Write>(
                &self,
                out: &mut ::diesel::serialize::Output<W, ::diesel::pg::Pg>,
            ) -> ::diesel::serialize::Result {
                <$inner as ::diesel::serialize::ToSql<$sql, ::diesel::pg::Pg>>::to_sql(&self.0, out)
            }
        }

        impl ::diesel::deserialize::FromSql<$sql, ::diesel::pg::Pg> for $name {
            fn from_sql(bytes: Option<&[u8]>) -> ::diesel::deserialize::Result<Self> {
                <$inner as ::diesel::deserialize::FromSql<$sql, ::diesel::pg::Pg>>::from_sql(bytes).map($name)
            }
        }
    };
}

/// Maps a fieldless enum to a `VarChar` column using the given labels.
/// Also provides `as_str` and `Display` with the same labels.
#[macro_export]
macro_rules! varchar_enum_impls {
    ($name:ident { $($variant:ident => $label:expr),+ $(,)* }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match *self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl ::diesel::serialize::ToSql<::diesel::sql_types::VarChar, ::diesel::pg::Pg> for $name {
            fn to_sql<W: ::std::io::Write>(
                &self,
                out: &mut ::diesel::serialize::Output<W, ::diesel::pg::Pg>,
            ) -> ::diesel::serialize::Result {
                ::std::io::Write::write_all(out, self.as_str().as_bytes())?;
                Ok(::diesel::serialize::IsNull::No)
            }
        }

        impl ::diesel::deserialize::FromSql<::diesel::sql_types::VarChar, ::diesel::pg::Pg> for $name {
            fn from_sql(bytes: Option<&[u8]>) -> ::diesel::deserialize::Result<Self> {
                match bytes {
                    $(Some(value) if value == $label.as_bytes() => Ok($name::$variant),)+
                    Some(value) => Err(format!(
                        "Unrecognized enum variant for {}: {}",
                        stringify!($name),
                        ::std::str::from_utf8(value).unwrap_or("unreadable value")
                    ).into()),
                    None => Err(format!("Unexpected null for non-null column `{}`", stringify!($name)).into()),
                }
            }
        }
    };
}
