/// Types of FLOAT values, as annotated by the upstream checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum Type {
    /// Left behind when resolution failed; never valid during code generation.
    Unknown = 0,
    Float = 1,
    Bool = 2,
}
