//! Bulk columnar alternative to the JSON `fam` response (SPEC_FULL.md
//! §4.6.1), behind the `arrow-transport` feature. Off by default: the JSON
//! envelope alone is a complete implementation of the serialization
//! boundary, this only matters to a deployment that wants the columnar
//! path for large SCF grids.

use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;

use arrow::array::Float32Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;

use rf_kernels::FamResult;

use crate::transport;

/// Precedes the length-prefixed frame so the client knows how to decode it.
pub const CONTENT_TYPE_JSON: u8 = 0;
pub const CONTENT_TYPE_ARROW: u8 = 1;

/// Encode a [`FamResult`] as an Arrow IPC stream: four `Float32` columns,
/// `scf_magnitude` flattened row-major, with `shape` carried as
/// schema-level metadata (`"shape" -> "R,C"`, SPEC_FULL.md §4.6.1).
pub fn encode_fam_arrow(result: &FamResult) -> std::io::Result<Vec<u8>> {
    let flat_scf: Vec<f32> = result.scf_magnitude.iter().flatten().copied().collect();
    let spectral_freqs: Vec<f32> = result.spectral_freqs.iter().map(|&v| v as f32).collect();
    let cyclic_freqs: Vec<f32> = result.cyclic_freqs.iter().map(|&v| v as f32).collect();

    let mut metadata = std::collections::HashMap::new();
    metadata.insert(
        "shape".to_string(),
        format!("{},{}", result.shape[0], result.shape[1]),
    );

    let schema = Arc::new(Schema::new_with_metadata(
        vec![
            Field::new("scf_magnitude", DataType::Float32, false),
            Field::new("spectral_freqs", DataType::Float32, false),
            Field::new("cyclic_freqs", DataType::Float32, false),
            Field::new("cyclic_profile", DataType::Float32, false),
        ],
        metadata,
    ));

    let max_len = flat_scf
        .len()
        .max(spectral_freqs.len())
        .max(cyclic_freqs.len())
        .max(result.cyclic_profile.len());
    let pad = |mut v: Vec<f32>| {
        v.resize(max_len, f32::NAN);
        v
    };

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float32Array::from(pad(flat_scf))),
            Arc::new(Float32Array::from(pad(spectral_freqs))),
            Arc::new(Float32Array::from(pad(cyclic_freqs))),
            Arc::new(Float32Array::from(pad(result.cyclic_profile.clone()))),
        ],
    )
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

    let mut buffer = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buffer, &schema)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        writer
            .write(&batch)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        writer
            .finish()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    }
    Ok(buffer)
}

/// Write a content-type byte followed by a length-prefixed frame.
pub fn write_typed_frame(stream: &mut TcpStream, content_type: u8, payload: &[u8]) -> std::io::Result<()> {
    stream.write_all(&[content_type])?;
    transport::write_frame(stream, payload)
}
