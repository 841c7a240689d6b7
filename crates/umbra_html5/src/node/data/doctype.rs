use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct DocTypeData {
    pub name: String,
    pub pub_identifier: String,
    pub sys_identifier: String,
}

impl DocTypeData {
    #[must_use]
    pub fn new(name: &str, pub_identifier: &str, sys_identifier: &str) -> Self {
        Self {
            name: name.to_owned(),
            pub_identifier: pub_identifier.to_owned(),
            sys_identifier: sys_identifier.to_owned(),
        }
    }
}

impl fmt::Display for DocTypeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<!DOCTYPE {}", self.name)?;
        if !self.pub_identifier.is_empty() {
            write!(f, r#" PUBLIC "{}""#, self.pub_identifier)?;
        }
        if !self.sys_identifier.is_empty() {
            write!(f, r#" SYSTEM "{}""#, self.sys_identifier)?;
        }
        write!(f, ">")
    }
}
