//! Component custom-id convention.
//!
//! Control ids are `key`, `key:arg` or `key|arg`. The first `:` or `|`
//! splits, so the arg may itself contain the other delimiter
//! (`paginate|next:<session id>`).

/// A parsed component custom id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlId<'a> {
    pub key: &'a str,
    pub arg: Option<&'a str>,
}

pub fn parse(custom_id: &str) -> ControlId<'_> {
    match custom_id.find(|c| c == ':' || c == '|') {
        Some(i) => ControlId {
            key: &custom_id[..i],
            arg: Some(&custom_id[i + 1..]),
        },
        None => ControlId {
            key: custom_id,
            arg: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_key() {
        assert_eq!(
            parse("help"),
            ControlId {
                key: "help",
                arg: None
            }
        );
    }

    #[test]
    fn colon_delimited() {
        assert_eq!(
            parse("confirm:123"),
            ControlId {
                key: "confirm",
                arg: Some("123")
            }
        );
    }

    #[test]
    fn pipe_delimited() {
        assert_eq!(
            parse("msg-delete|42"),
            ControlId {
                key: "msg-delete",
                arg: Some("42")
            }
        );
    }

    #[test]
    fn arg_keeps_the_other_delimiter() {
        assert_eq!(
            parse("paginate|next:abc-def"),
            ControlId {
                key: "paginate",
                arg: Some("next:abc-def")
            }
        );
    }
}
