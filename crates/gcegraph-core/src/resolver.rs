//! Machine-type size resolution.
//!
//! The catalog is built from the provider's machine types, then the user
//! override table is laid on top so overrides win on name collision.
//!
//! ## Override file format
//!
//! One mapping literal per line, blank lines and `#` comments ignored:
//!
//! ```text
//! {'custom-2-4096': (2, 4096)}
//! {"custom-8-30720": [8, 30720], 'custom-1-1024': (1, 1024.0)}
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::resources::MachineType;

/// vCPU count and memory of a machine type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineSize {
    pub vcpus: u32,
    pub memory_mb: f64,
}

impl MachineSize {
    pub fn new(vcpus: u32, memory_mb: f64) -> Self {
        Self { vcpus, memory_mb }
    }
}

/// Lookup failure: the name is in neither the provider catalog nor the overrides.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unresolved machine type {0}")]
pub struct UnresolvedMachineType(pub String);

/// Errors loading the override table.
#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("cannot read override table {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("override table line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// User-supplied sizes for machine types missing from the provider catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    entries: BTreeMap<String, MachineSize>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses an override file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OverrideError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| OverrideError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&content)?;
        debug!(path = %path.display(), entries = table.len(), "override table loaded");
        Ok(table)
    }

    /// Parses override lines. A later entry for the same name replaces an earlier one.
    pub fn parse(content: &str) -> Result<Self, OverrideError> {
        let mut table = Self::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entries = LineParser::new(line)
                .parse_mapping()
                .map_err(|message| OverrideError::Parse {
                    line: idx + 1,
                    message,
                })?;
            for (name, size) in entries {
                table.insert(name, size);
            }
        }
        Ok(table)
    }

    pub fn insert(&mut self, name: impl Into<String>, size: MachineSize) {
        self.entries.insert(name.into(), size);
    }

    pub fn get(&self, name: &str) -> Option<MachineSize> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MachineSize)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Merged machine-type catalog.
#[derive(Debug, Clone, Default)]
pub struct SizeCatalog {
    sizes: HashMap<String, MachineSize>,
}

impl SizeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the catalog from provider machine types.
    ///
    /// The same type is listed once per zone; duplicates overwrite.
    pub fn from_machine_types<I>(machine_types: I) -> Self
    where
        I: IntoIterator<Item = MachineType>,
    {
        let mut catalog = Self::new();
        for mt in machine_types {
            catalog
                .sizes
                .insert(mt.name, MachineSize::new(mt.guest_cpus, mt.memory_mb));
        }
        catalog
    }

    /// Applies overrides on top of the catalog; override entries win.
    pub fn overlay(mut self, overrides: &OverrideTable) -> Self {
        for (name, size) in overrides.iter() {
            if let Some(prev) = self.sizes.insert(name.to_string(), size)
                && prev != size
            {
                debug!(machine_type = name, ?prev, ?size, "override replaces catalog size");
            }
        }
        self
    }

    pub fn lookup(&self, name: &str) -> Result<MachineSize, UnresolvedMachineType> {
        self.sizes
            .get(name)
            .copied()
            .ok_or_else(|| UnresolvedMachineType(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// Recursive-descent parser for a single `{'name': (cpus, mem), ...}` line.
struct LineParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LineParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        let src: &'a str = self.src;
        &src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        self.skip_ws();
        match self.peek() {
            Some(found) if found == c => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(format!("expected '{c}' at column {}, found '{found}'", self.pos + 1)),
            None => Err(format!("expected '{c}' at end of line")),
        }
    }

    /// Consumes `c` if it is the next non-space character.
    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn parse_mapping(mut self) -> Result<Vec<(String, MachineSize)>, String> {
        self.expect('{')?;
        let mut entries = Vec::new();
        loop {
            if self.eat('}') {
                break;
            }
            let name = self.parse_string()?;
            self.expect(':')?;
            let size = self.parse_size()?;
            entries.push((name, size));
            if self.eat(',') {
                continue;
            }
            self.expect('}')?;
            break;
        }
        self.skip_ws();
        if !self.rest().is_empty() {
            return Err(format!("unexpected trailing input {:?}", self.rest()));
        }
        Ok(entries)
    }

    fn parse_string(&mut self) -> Result<String, String> {
        self.skip_ws();
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            Some(c) => return Err(format!("expected quoted machine type name, found '{c}'")),
            None => return Err("expected quoted machine type name".to_string()),
        };
        self.pos += 1;

        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    self.pos += i + 1;
                    if out.is_empty() {
                        return Err("empty machine type name".to_string());
                    }
                    return Ok(out);
                }
                c => out.push(c),
            }
        }
        Err("unterminated string".to_string())
    }

    fn parse_size(&mut self) -> Result<MachineSize, String> {
        self.skip_ws();
        let close = match self.peek() {
            Some('(') => ')',
            Some('[') => ']',
            _ => return Err("expected (vcpus, memory_mb) tuple".to_string()),
        };
        self.pos += 1;

        let cpus = self.parse_number()?;
        self.expect(',')?;
        let memory = self.parse_number()?;
        self.eat(',');
        self.expect(close)?;

        if cpus.fract() != 0.0 || cpus < 1.0 || cpus > f64::from(u32::MAX) {
            return Err(format!("vcpus must be a positive integer, got {cpus}"));
        }
        if !memory.is_finite() || memory < 0.0 {
            return Err(format!("memory_mb must be a non-negative number, got {memory}"));
        }
        Ok(MachineSize::new(cpus as u32, memory))
    }

    fn parse_number(&mut self) -> Result<f64, String> {
        self.skip_ws();
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E' | '_')))
            .unwrap_or(self.rest().len());
        let token = &self.rest()[..len];
        let value = token
            .replace('_', "")
            .parse::<f64>()
            .map_err(|_| format!("invalid number {token:?}"))?;
        self.pos += len;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn mt(name: &str, cpus: u32, mem: f64) -> MachineType {
        MachineType {
            name: name.to_string(),
            guest_cpus: cpus,
            memory_mb: mem,
        }
    }

    #[test]
    fn test_parse_single_entry_line() {
        let table = OverrideTable::parse("{'custom-2-4096': (2, 4096)}\n").unwrap();
        assert_eq!(table.get("custom-2-4096"), Some(MachineSize::new(2, 4096.0)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_mixed_syntax() {
        let table = OverrideTable::parse(
            "# custom shapes\n\
             \n\
             {\"custom-8-30720\": [8, 30720], 'custom-1-1536': (1, 1536.5,)}\n\
             {'e2-custom-4-8192':(4,8_192)}\n",
        )
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("custom-1-1536"), Some(MachineSize::new(1, 1536.5)));
        assert_eq!(table.get("e2-custom-4-8192"), Some(MachineSize::new(4, 8192.0)));
    }

    #[test]
    fn test_parse_later_line_wins() {
        let table = OverrideTable::parse("{'x': (1, 1024)}\n{'x': (2, 2048)}").unwrap();
        assert_eq!(table.get("x"), Some(MachineSize::new(2, 2048.0)));
    }

    #[test]
    fn test_parse_empty_mapping() {
        assert!(OverrideTable::parse("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors_carry_line_number() {
        let err = OverrideTable::parse("{'ok': (1, 1)}\n{'bad': (1)}").unwrap_err();
        match err {
            OverrideError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        for line in [
            "{'x': (0, 1024)}",
            "{'x': (1.5, 1024)}",
            "{'x': (2, -1)}",
            "{'x': (2, abc)}",
            "{x: (2, 1024)}",
            "{'x': (2, 1024)} trailing",
            "{'x' (2, 1024)}",
            "{'x': (2, 1024)",
            "{'': (2, 1024)}",
            "{'x: (2, 1024)}",
        ] {
            assert!(OverrideTable::parse(line).is_err(), "accepted {line}");
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{'custom-2-4096': (2, 4096)}}").unwrap();
        let table = OverrideTable::load(file.path()).unwrap();
        assert_eq!(table.get("custom-2-4096"), Some(MachineSize::new(2, 4096.0)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            OverrideTable::load(dir.path().join("custom_sizes.dict")),
            Err(OverrideError::Io { .. })
        ));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut overrides = OverrideTable::new();
        overrides.insert("n1-standard-1", MachineSize::new(4, 1000.0));
        overrides.insert("custom-2-4096", MachineSize::new(2, 4096.0));

        let catalog = SizeCatalog::from_machine_types(vec![
            mt("n1-standard-1", 1, 3840.0),
            mt("n1-standard-2", 2, 7680.0),
        ])
        .overlay(&overrides);

        assert_eq!(catalog.lookup("n1-standard-1"), Ok(MachineSize::new(4, 1000.0)));
        assert_eq!(catalog.lookup("n1-standard-2"), Ok(MachineSize::new(2, 7680.0)));
        assert_eq!(catalog.lookup("custom-2-4096"), Ok(MachineSize::new(2, 4096.0)));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_lookup_unresolved_names_type() {
        let catalog = SizeCatalog::from_machine_types(vec![mt("n1-standard-1", 1, 3840.0)]);
        let err = catalog.lookup("custom-6-23040").unwrap_err();
        assert_eq!(err, UnresolvedMachineType("custom-6-23040".to_string()));
        assert_eq!(err.to_string(), "unresolved machine type custom-6-23040");
    }

    #[test]
    fn test_duplicate_catalog_entries_overwrite() {
        let catalog = SizeCatalog::from_machine_types(vec![
            mt("n1-standard-1", 1, 3840.0),
            mt("n1-standard-1", 1, 3840.0),
        ]);
        assert_eq!(catalog.len(), 1);
    }
}
