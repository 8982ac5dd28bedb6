//! Text-backed enums
//!
//! Domain enums are stored as `TEXT` columns guarded by `CHECK` constraints
//! and travel as SCREAMING_SNAKE_CASE strings in JSON and query strings.
//! [`text_enum!`] derives the string conversions so the sqlx row types can use
//! `#[sqlx(try_from = "String")]` and binds can use `as_str()`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
        $(default = $default:ident)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        $(
            impl Default for $name {
                fn default() -> Self {
                    $name::$default
                }
            }
        )?

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::features::shared::enums::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::features::shared::enums::UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::features::shared::enums::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub(crate) use text_enum;

/// Sort direction shared by list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    text_enum! {
        /// Test enum
        Color { Red => "RED", DarkBlue => "DARK_BLUE" }
        default = Red
    }

    #[test]
    fn test_text_enum_conversions() {
        assert_eq!(Color::DarkBlue.as_str(), "DARK_BLUE");
        assert_eq!("DARK_BLUE".parse::<Color>().unwrap(), Color::DarkBlue);
        assert_eq!(Color::default(), Color::Red);
        assert_eq!(Color::ALL.len(), 2);

        let err = "PINK".parse::<Color>().unwrap_err();
        assert_eq!(err.to_string(), "invalid Color value 'PINK'");

        assert_eq!(serde_json::to_string(&Color::DarkBlue).unwrap(), "\"DARK_BLUE\"");
        assert!(serde_json::from_str::<Color>("\"dark_blue\"").is_err());
        assert_eq!(Color::try_from("RED".to_string()).unwrap(), Color::Red);
    }
}
