use crate::store::{parse_dataset, write_atomic};
use anyhow::{anyhow, bail, Context};
use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DATA_ENTRY: &str = "data/groups.json";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
pub const BUNDLE_FORMAT_V1: &str = "gradebook-dataset-v1";
pub const PLAIN_JSON_FORMAT: &str = "plain-json";

/// `manifest.json` inside a bundle. Only `format` is required on import; a
/// present `dataSha256` must match the data entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleManifest {
    format: String,
    #[serde(default)]
    version: u32,
    #[serde(default)]
    app_version: Option<String>,
    #[serde(default)]
    exported_at: Option<String>,
    #[serde(default)]
    data_sha256: Option<String>,
}

impl BundleManifest {
    fn for_payload(payload: &[u8]) -> Self {
        BundleManifest {
            format: BUNDLE_FORMAT_V1.to_string(),
            version: 1,
            app_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            exported_at: Some(Local::now().to_rfc3339()),
            data_sha256: Some(sha256_hex(payload)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub group_count: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Packs the current data file into a zip next to a checksummed manifest.
/// The bundle is assembled in memory and lands at `out_path` in one rename.
pub fn export_dataset_bundle(data_file: &Path, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let payload = std::fs::read(data_file)
        .with_context(|| format!("cannot read data file {}", data_file.display()))?;
    let manifest = BundleManifest::for_payload(&payload);
    let manifest_json =
        serde_json::to_vec_pretty(&manifest).context("cannot encode bundle manifest")?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let entries = [
        (MANIFEST_ENTRY, manifest_json.as_slice()),
        (DATA_ENTRY, payload.as_slice()),
    ];
    for (name, bytes) in entries {
        zip.start_file(name, opts)
            .with_context(|| format!("cannot add {name} to bundle"))?;
        zip.write_all(bytes)
            .with_context(|| format!("cannot write {name} into bundle"))?;
    }
    let bundle = zip.finish().context("cannot finish bundle")?.into_inner();

    write_atomic(out_path, &bundle)?;

    Ok(ExportSummary {
        bundle_format: manifest.format,
        entry_count: entries.len(),
        sha256: manifest.data_sha256.unwrap_or_default(),
    })
}

/// Replaces `data_file` with the dataset held in `in_path`, which is either a
/// bundle written by [`export_dataset_bundle`] or a bare JSON dataset. The
/// live file is untouched unless the payload validates.
pub fn import_dataset_bundle(in_path: &Path, data_file: &Path) -> anyhow::Result<ImportSummary> {
    let raw = std::fs::read(in_path)
        .with_context(|| format!("cannot read import source {}", in_path.display()))?;
    let (format, payload) = if raw.starts_with(ZIP_MAGIC) {
        (BUNDLE_FORMAT_V1, unpack_bundle(Cursor::new(raw.as_slice()))?)
    } else {
        (PLAIN_JSON_FORMAT, raw)
    };

    let text = String::from_utf8(payload).context("dataset is not valid UTF-8")?;
    let dataset =
        parse_dataset(&text).map_err(|msg| anyhow!("dataset failed validation: {msg}"))?;
    write_atomic(data_file, text.as_bytes())?;

    Ok(ImportSummary {
        bundle_format_detected: format.to_string(),
        group_count: dataset.groups.len(),
    })
}

fn read_entry<R>(archive: &mut ZipArchive<R>, name: &str) -> anyhow::Result<Vec<u8>>
where
    R: Read + Seek,
{
    let mut entry = archive
        .by_name(name)
        .with_context(|| format!("bundle has no {name}"))?;
    let mut out = Vec::new();
    entry
        .read_to_end(&mut out)
        .with_context(|| format!("cannot extract {name}"))?;
    Ok(out)
}

fn unpack_bundle<R: Read + Seek>(reader: R) -> anyhow::Result<Vec<u8>> {
    let mut archive = ZipArchive::new(reader).context("not a readable zip bundle")?;

    let manifest_json = read_entry(&mut archive, MANIFEST_ENTRY)?;
    let manifest: BundleManifest = serde_json::from_slice(&manifest_json)
        .context("manifest.json is not a bundle manifest")?;
    if manifest.format != BUNDLE_FORMAT_V1 {
        bail!("unsupported bundle format: {}", manifest.format);
    }

    let payload = read_entry(&mut archive, DATA_ENTRY)?;
    if let Some(expected) = manifest.data_sha256.as_deref() {
        let actual = sha256_hex(&payload);
        if actual != expected {
            bail!("checksum mismatch: manifest {expected}, payload {actual}");
        }
    }
    Ok(payload)
}
