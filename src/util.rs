use crate::{batch::Batch, config::Config};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Stable id for a (config, inputs) pair; independent of input order.
pub fn run_id(cfg: &Config, batch: &Batch) -> String {
    let mut inputs: Vec<(String, String)> = batch
        .images()
        .iter()
        .map(|img| (img.name.clone(), sha256_hex(&img.bytes)))
        .collect();
    inputs.sort();

    let mut h = Sha256::new();
    h.update(cfg.normalized_for_hash().as_bytes());
    for (name, digest) in &inputs {
        h.update(name.as_bytes());
        h.update([0u8]);
        h.update(digest.as_bytes());
    }
    format!("{:x}", h.finalize())
}
