use std::{fmt::Display, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub(crate) line: u32,
    pub(crate) column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Where a node of the resolved AST came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub(crate) filename: Arc<String>,
    pub(crate) cursor: Position,
}

impl Location {
    pub fn new(filename: Arc<String>, line: u32, column: u32) -> Self {
        Self {
            filename,
            cursor: Position::new(line, column),
        }
    }

    pub fn dummy() -> Self {
        Self::new(Arc::new(String::from("<unknown>")), 0, 0)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn line(&self) -> u32 {
        self.cursor.line
    }

    pub fn column(&self) -> u32 {
        self.cursor.column
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line(), self.column())
    }
}
