/// Heightmap export as single-channel float DDS textures
use crate::error::Result;
use crate::heightmap::Heightmap;
use ddsfile::{AlphaMode, D3D10ResourceDimension, Dds, DxgiFormat, NewDxgiParams};
use half::f16;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write heights as an R32_Float texture. Row 0 is the minimum-Y edge of the bounds.
pub fn write_heightmap_dds(path: &Path, heightmap: &Heightmap) -> Result<()> {
    let mut bytes = Vec::with_capacity(heightmap.heights.len() * 4);
    for &height in &heightmap.heights {
        bytes.extend_from_slice(&(height as f32).to_le_bytes());
    }
    write_single_channel(path, heightmap.size, DxgiFormat::R32_Float, bytes)
}

/// Write heights as an R16_Float texture for compact engine import.
pub fn write_heightmap_dds_half(path: &Path, heightmap: &Heightmap) -> Result<()> {
    let mut bytes = Vec::with_capacity(heightmap.heights.len() * 2);
    for &height in &heightmap.heights {
        let bits = f16::from_f64(height).to_bits();
        bytes.extend_from_slice(&bits.to_le_bytes());
    }
    write_single_channel(path, heightmap.size, DxgiFormat::R16_Float, bytes)
}

fn write_single_channel(path: &Path, size: usize, format: DxgiFormat, bytes: Vec<u8>) -> Result<()> {
    let params = NewDxgiParams {
        height: size as u32,
        width: size as u32,
        depth: None,
        format,
        mipmap_levels: Some(1),
        array_layers: Some(1),
        caps2: None,
        is_cubemap: false,
        resource_dimension: D3D10ResourceDimension::Texture2D,
        alpha_mode: AlphaMode::Unknown,
    };

    let mut dds = Dds::new_dxgi(params)?;
    dds.data = bytes;
    let mut writer = BufWriter::new(File::create(path)?);
    dds.write(&mut writer)?;
    writer.flush()?;
    Ok(())
}
