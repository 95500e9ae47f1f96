use nutype::nutype;

pub const MAX_TEST_NAME_LENGTH: usize = 128;

/// Name of a test. Also forms part of file names in the shared folder,
/// so path separators are rejected.
#[nutype(
    sanitize(trim),
    validate(
        not_empty,
        len_char_max = MAX_TEST_NAME_LENGTH,
        predicate = |name: &str| !name.contains(['/', '\\'])
    ),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        AsRef,
        Deref,
        TryFrom,
        Into,
        Hash,
        Display,
        Serialize,
        Deserialize,
    )
)]
pub struct TestName(String);

impl TestName {
    /// `<test>_procedures.json`
    pub fn procedures_file_name(&self) -> String {
        format!("{}_procedures.json", self.as_str())
    }

    /// `<test>_<original>`, the name an uploaded file is stored under.
    pub fn upload_file_name(&self, original: &str) -> String {
        format!("{}_{}", self.as_str(), original)
    }
}
