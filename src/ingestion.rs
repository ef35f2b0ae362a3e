use crate::aggregator::merge_into;
use crate::error::{FiscalError, Result};
use crate::parser::parse_text;
use crate::schema::{FiscalConfig, ParsedDataset};
use encoding_rs::WINDOWS_1252;
use log::{debug, info};
use std::path::Path;

/// Raw contents of one uploaded declaration file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let bytes = std::fs::read(path).map_err(|source| FiscalError::FileRead {
            file: name.clone(),
            source,
        })?;

        Ok(Self { name, bytes })
    }

    pub fn text(&self) -> String {
        decode_latin1(&self.bytes)
    }
}

/// Decodes a declaration labelled ISO-8859-1.
///
/// The label is read as windows-1252, the way browsers resolve it, so 0x80-0x9F
/// become typographic characters such as `–` and `€` rather than C1 controls.
pub fn decode_latin1(bytes: &[u8]) -> String {
    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}

/// Parses every upload on its own and folds the partial results together.
pub fn parse_uploads(files: &[UploadedFile], config: &FiscalConfig) -> ParsedDataset {
    let mut dataset = ParsedDataset::new();

    for file in files {
        let partial = parse_text(&file.text(), config);
        debug!(
            "File {} contributed {} compan(ies)",
            file.name,
            partial.len()
        );
        merge_into(&mut dataset, partial);
    }

    dataset
}

/// Reads, decodes and parses a batch of declaration files.
///
/// All files are read before any parsing starts; the first read failure rejects the
/// whole batch and names the offending file.
pub fn parse_files<P: AsRef<Path>>(paths: &[P], config: &FiscalConfig) -> Result<ParsedDataset> {
    info!("Parsing batch of {} declaration file(s)", paths.len());

    let uploads = paths
        .iter()
        .map(UploadedFile::read)
        .collect::<Result<Vec<_>>>()?;

    let dataset = parse_uploads(&uploads, config);
    info!(
        "Batch produced {} compan(ies) from {} file(s)",
        dataset.len(),
        uploads.len()
    );

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PeriodKey;

    #[test]
    fn test_decode_latin1() {
        // "Mês" and "SAÍDAS" as single-byte ISO-8859-1.
        let bytes = b"M\xeas SA\xcdDAS";
        assert_eq!(decode_latin1(bytes), "Mês SAÍDAS");
    }

    #[test]
    fn test_decode_latin1_maps_windows_1252_punctuation() {
        assert_eq!(decode_latin1(b"A\x96B"), "A–B");
        assert_eq!(decode_latin1(b"\x93Loja\x94 \x80"), "“Loja” €");
    }

    #[test]
    fn test_company_name_keeps_en_dash() {
        let bytes = b"M\xeas ou per\xedodo/ano: Junho/2024\nCNPJ: 1\nEmpresa: Padaria \x96 Centro\n";
        let dataset = parse_uploads(
            &[UploadedFile::new("a.txt", bytes.to_vec())],
            &FiscalConfig::default(),
        );
        assert_eq!(dataset["1"].name, "Padaria – Centro");
    }

    #[test]
    fn test_parse_uploads_sums_across_files() {
        let block = "Mês ou período/ano: Junho/2024\nCNPJ: 1\nEmpresa: A\nSAÍDAS\n5.102 100,00\n";
        let files = vec![
            UploadedFile::new("a.txt", encode_latin1(block)),
            UploadedFile::new("b.txt", encode_latin1(block)),
        ];

        let dataset = parse_uploads(&files, &FiscalConfig::default());
        let totals = dataset["1"].periods[&PeriodKey::new("Junho", 2024)];
        assert_eq!(totals.revenue, 200.0);
    }

    #[test]
    fn test_parse_uploads_keeps_last_name_in_batch() {
        let first = "Mês ou período/ano: Junho/2024\nCNPJ: 1\nEmpresa: Antiga\n";
        let second = "Mês ou período/ano: Julho/2024\nCNPJ: 1\nEmpresa: Nova\n";
        let files = vec![
            UploadedFile::new("a.txt", encode_latin1(first)),
            UploadedFile::new("b.txt", encode_latin1(second)),
        ];

        let dataset = parse_uploads(&files, &FiscalConfig::default());
        assert_eq!(dataset["1"].name, "Nova");
        assert_eq!(dataset["1"].periods.len(), 2);
    }

    #[test]
    fn test_parse_files_rejects_batch_on_missing_file() {
        let err = parse_files(&["/definitely/not/here.txt"], &FiscalConfig::default())
            .unwrap_err();
        match err {
            FiscalError::FileRead { file, .. } => assert_eq!(file, "here.txt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_files_empty_batch() {
        let paths: [&str; 0] = [];
        let dataset = parse_files(&paths, &FiscalConfig::default()).unwrap();
        assert!(dataset.is_empty());
    }

    fn encode_latin1(text: &str) -> Vec<u8> {
        text.chars().map(|c| c as u32 as u8).collect()
    }
}
