#[derive(PartialEq)]
pub(super) enum Syntax {
    Proto3,
}

impl From<Option<&str>> for Syntax {
    fn from(optional_str: Option<&str>) -> Self {
        match optional_str {
            Some("proto3") => Syntax::Proto3,
            None => panic!("missing syntax declaration; only proto3 is supported"),
            Some(s) => panic!("unsupported syntax {s:?}; only proto3 is supported"),
        }
    }
}
