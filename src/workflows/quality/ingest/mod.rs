mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;

use super::population::PopulationSnapshot;

#[derive(Debug)]
pub enum SnapshotImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for SnapshotImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotImportError::Io(err) => write!(f, "failed to read snapshot extract: {}", err),
            SnapshotImportError::Csv(err) => write!(f, "invalid snapshot CSV data: {}", err),
        }
    }
}

impl std::error::Error for SnapshotImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotImportError::Io(err) => Some(err),
            SnapshotImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SnapshotImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SnapshotImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Assembles a `PopulationSnapshot` from the four tabular extracts. The
/// pharmacy and lab tables are optional: a missing table simply contributes
/// no events, it never aborts the import.
pub struct SnapshotImporter;

impl SnapshotImporter {
    pub fn from_paths<P: AsRef<Path>>(
        members: P,
        claims: P,
        pharmacy: Option<P>,
        labs: Option<P>,
    ) -> Result<PopulationSnapshot, SnapshotImportError> {
        let members = std::fs::File::open(members)?;
        let claims = std::fs::File::open(claims)?;
        let pharmacy = pharmacy.map(std::fs::File::open).transpose()?;
        let labs = labs.map(std::fs::File::open).transpose()?;
        Self::from_readers(members, claims, pharmacy, labs)
    }

    pub fn from_readers<R: Read>(
        members: R,
        claims: R,
        pharmacy: Option<R>,
        labs: Option<R>,
    ) -> Result<PopulationSnapshot, SnapshotImportError> {
        let members = parser::parse_members(members)?;
        let mut events = parser::parse_claims(claims)?;

        if let Some(pharmacy) = pharmacy {
            events.extend(parser::parse_pharmacy(pharmacy)?);
        }
        if let Some(labs) = labs {
            events.extend(parser::parse_labs(labs)?);
        }

        Ok(PopulationSnapshot { members, events })
    }
}
