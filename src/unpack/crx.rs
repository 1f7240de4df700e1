use crate::error::ArchiveError;

/// Locate the ZIP payload inside a CRX container.
///
/// CRX3: magic "Cr24", version 3, header length, protobuf header, ZIP data.
/// CRX2: magic "Cr24", version 2, public key length, signature length,
/// key, signature, ZIP data. All integers are little-endian u32.
pub fn crx_zip_payload(data: &[u8]) -> Result<&[u8], ArchiveError> {
    if data.len() < 12 {
        return Err(ArchiveError::InvalidCrx("file too small".into()));
    }

    if !data.starts_with(b"Cr24") {
        return Err(ArchiveError::InvalidCrx("invalid magic".into()));
    }

    let version = read_u32(data, 4)?;
    let zip_start = match version {
        3 => 12 + read_u32(data, 8)? as usize,
        2 => {
            if data.len() < 16 {
                return Err(ArchiveError::InvalidCrx("truncated CRX2 header".into()));
            }
            let key_len = read_u32(data, 8)? as usize;
            let sig_len = read_u32(data, 12)? as usize;
            16usize.saturating_add(key_len).saturating_add(sig_len)
        }
        other => {
            return Err(ArchiveError::InvalidCrx(format!(
                "unsupported version {}",
                other
            )));
        }
    };

    if zip_start >= data.len() {
        return Err(ArchiveError::InvalidCrx("invalid header length".into()));
    }

    Ok(&data[zip_start..])
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, ArchiveError> {
    data.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| ArchiveError::InvalidCrx("truncated header".into()))
}
