//! Generate skinning palette frames for a waving bone chain
//!
//! Builds a rig (a generated chain, or a TOML rig manifest), drives a pose with
//! a per-bone sine wave and writes every frame's GPU palette to one file.
//!
//! # Output layout
//! ```text
//! 0x00: bone_count u32 LE
//! 0x04: frame_count u32 LE
//! 0x08: frames (frame_count × bone_count × 48 bytes, 3x4 row-major matrices)
//! ```

use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use glam::{Quat, Vec3};
use nether_rig::{BoneMatrix3x4, Pose, RigDesc, Skeleton, Transform};

/// Palette file header size in bytes
const HEADER_SIZE: usize = 8;

#[derive(Parser)]
#[command(name = "gen-rig-wave")]
#[command(about = "Generate skinning palette frames for a waving bone chain")]
#[command(version)]
struct Cli {
    /// Number of bones in the generated chain (ignored with --rig)
    #[arg(short, long, default_value_t = 3)]
    bones: usize,

    /// Number of frames to sample over one wave period
    #[arg(short, long, default_value_t = 30)]
    frames: u32,

    /// TOML rig manifest to animate instead of a generated chain
    #[arg(short, long)]
    rig: Option<PathBuf>,

    /// Output palette file
    #[arg(short, long, default_value = "rig-wave.palette")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let skeleton = match &cli.rig {
        Some(path) => load_rig(path)?,
        None => build_chain_rig(cli.bones)?,
    };

    let data = generate_wave_palette(Arc::new(skeleton), cli.frames)?;
    write_palette(&cli.output, &data)?;

    tracing::info!(
        "Generated {} ({} frames, {} bytes)",
        cli.output.display(),
        cli.frames,
        data.len()
    );
    Ok(())
}

/// Chain of bones stacked along +Y, 1.5 units apart
fn build_chain_rig(bone_count: usize) -> Result<Skeleton> {
    if bone_count == 0 {
        bail!("Chain needs at least one bone");
    }

    let mut skeleton = Skeleton::new();
    let mut parent = skeleton.create_bone()?;
    skeleton.rename_bone(parent, "bone_0")?;
    for i in 1..bone_count {
        let bone = skeleton.create_child(parent)?;
        skeleton.rename_bone(bone, &format!("bone_{i}"))?;
        skeleton.set_rest_transform(bone, Transform::from_translation(Vec3::new(0.0, 1.5, 0.0)))?;
        skeleton.set_bone_length(bone, 1.5)?;
        parent = bone;
    }
    skeleton.calculate_bind_pose();
    Ok(skeleton)
}

fn load_rig(path: &Path) -> Result<Skeleton> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rig manifest: {:?}", path))?;
    let desc: RigDesc = toml::from_str(&source)
        .with_context(|| format!("Failed to parse rig manifest: {:?}", path))?;
    let skeleton = Skeleton::from_desc(&desc)
        .with_context(|| format!("Invalid rig manifest: {:?}", path))?;

    tracing::info!("Loaded rig {:?}: {} bones", path, skeleton.bone_count());
    Ok(skeleton)
}

fn generate_wave_palette(skeleton: Arc<Skeleton>, frame_count: u32) -> Result<Vec<u8>> {
    let bone_count = skeleton.bone_count();
    let mut pose = Pose::new(Arc::clone(&skeleton))?;

    let mut palette: Vec<BoneMatrix3x4> = Vec::with_capacity(frame_count as usize * bone_count);
    for frame in 0..frame_count {
        let t = (frame as f32 / frame_count as f32) * TAU;

        for bone in 0..bone_count {
            // Each bone sways around Z with a phase offset, ±0.3 radians
            let phase = bone as f32 * 0.5;
            let angle = (t + phase).sin() * 0.3;
            let rest = skeleton.bind_pose().relative_transform(bone);
            pose.set_relative_transform(
                bone,
                Transform {
                    rotation: rest.rotation * Quat::from_rotation_z(angle),
                    ..rest
                },
            );
        }

        pose.write_gpu_palette(&mut palette);
    }

    let mut bytes = Vec::with_capacity(HEADER_SIZE + palette.len() * nether_rig::BONE_MATRIX_SIZE);
    bytes.extend_from_slice(&(bone_count as u32).to_le_bytes());
    bytes.extend_from_slice(&frame_count.to_le_bytes());
    bytes.extend_from_slice(bytemuck::cast_slice(&palette));
    Ok(bytes)
}

fn write_palette(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    std::fs::write(path, data).with_context(|| format!("Failed to write palette: {:?}", path))
}
