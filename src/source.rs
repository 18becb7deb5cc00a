//! Position table shared by every file of the loaded package.

/// One loaded source file: name, full text, and line-start offsets.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> SourceFile {
        let name = name.into();
        let text = text.into();

        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }

        SourceFile {
            name,
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based line containing the given byte offset.
    pub fn line_of(&self, offset: usize) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(i) => i as u32 + 1,
            Err(i) => i as u32,
        }
    }

    /// 1-based column (byte-based) of the given offset within its line.
    pub fn column_of(&self, offset: usize) -> u32 {
        let line = self.line_of(offset) as usize;
        (offset - self.line_starts[line - 1]) as u32 + 1
    }
}

/// The position table: every syntax tree of a package indexes into one of these.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> SourceMap {
        SourceMap { files: Vec::new() }
    }

    /// Adds a file and returns its id.
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> usize {
        self.files.push(SourceFile::new(name, text));
        self.files.len() - 1
    }

    pub fn file(&self, id: usize) -> &SourceFile {
        &self.files[id]
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::SourceFile;

    #[test]
    fn test_line_lookup() {
        let f = SourceFile::new("a.go", "package main\n\nfunc main() {\n}\n");

        assert_eq!(f.line_of(0), 1);
        assert_eq!(f.line_of(12), 1);
        assert_eq!(f.line_of(13), 2);
        assert_eq!(f.line_of(14), 3);
        assert_eq!(f.column_of(0), 1);
        assert_eq!(f.column_of(8), 9);
        assert_eq!(f.column_of(19), 6);
    }
}
