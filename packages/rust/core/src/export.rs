//! Snapshot export: binary PPM images plus a JSON manifest.
//!
//! A snapshot directory holds one `<id>.ppm` and one `<id>.json` per saved
//! view. The manifest records everything needed to render the image again.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, instrument};

use mandelbrot_shared::{
    CURRENT_SCHEMA_VERSION, Result, SnapshotId, SnapshotManifest, ViewState, ViewerError,
};

use crate::render::{RenderParams, RenderedFrame};

/// Tool version recorded in manifests.
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Write `frame` as a binary (P6) PPM file.
pub fn write_ppm(frame: &RenderedFrame, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| ViewerError::io(path, e))?;
    let mut out = BufWriter::new(file);

    write!(out, "P6\n{} {}\n255\n", frame.width, frame.height)
        .and_then(|()| out.write_all(&frame.to_rgb_bytes()))
        .and_then(|()| out.flush())
        .map_err(|e| ViewerError::io(path, e))
}

/// Describe `frame` for a manifest whose image lives at `image_file`.
pub fn build_manifest(
    frame: &RenderedFrame,
    view: &ViewState,
    params: &RenderParams,
    id: SnapshotId,
    image_file: &str,
) -> SnapshotManifest {
    SnapshotManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        id,
        tool_version: TOOL_VERSION.to_string(),
        created_at: Utc::now(),
        width: frame.width,
        height: frame.height,
        view: *view,
        max_iterations: params.max_iterations,
        escape_radius: params.escape_radius,
        palette: params.palette.name().to_string(),
        image_file: image_file.to_string(),
        pixel_hash: frame.pixel_hash(),
    }
}

/// Write `manifest` as pretty-printed JSON.
pub fn write_manifest(manifest: &SnapshotManifest, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json).map_err(|e| ViewerError::io(path, e))
}

/// Read a manifest, rejecting schema versions newer than this build.
pub fn read_manifest(path: &Path) -> Result<SnapshotManifest> {
    let data = std::fs::read_to_string(path).map_err(|e| ViewerError::io(path, e))?;
    let manifest: SnapshotManifest = serde_json::from_str(&data)?;

    if manifest.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(ViewerError::validation(format!(
            "manifest schema_version {} is newer than supported version {}",
            manifest.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }

    Ok(manifest)
}

/// Save `frame` into `dir` as `<id>.ppm` + `<id>.json`.
///
/// Returns the manifest and the path of the manifest file.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn save_snapshot(
    frame: &RenderedFrame,
    view: &ViewState,
    params: &RenderParams,
    dir: &Path,
) -> Result<(SnapshotManifest, PathBuf)> {
    std::fs::create_dir_all(dir).map_err(|e| ViewerError::io(dir, e))?;

    let id = SnapshotId::new();
    let image_file = format!("{id}.ppm");
    write_ppm(frame, &dir.join(&image_file))?;

    let manifest = build_manifest(frame, view, params, id, &image_file);
    let manifest_path = dir.join(format!("{}.json", manifest.id));
    write_manifest(&manifest, &manifest_path)?;

    info!(id = %manifest.id, path = %manifest_path.display(), "snapshot saved");

    Ok((manifest, manifest_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::Palette;
    use crate::render::{SilentProgress, render};

    fn params() -> RenderParams {
        RenderParams {
            width: 12,
            height: 9,
            max_iterations: 40,
            escape_radius: 2.0,
            palette: Palette::Fire,
            threads: 3,
        }
    }

    #[test]
    fn ppm_has_header_and_pixel_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("frame.ppm");
        let view = ViewState::home(12, 9);
        let frame = render(&view, &params(), &SilentProgress).expect("render");

        write_ppm(&frame, &path).expect("write ppm");

        let bytes = std::fs::read(&path).expect("read back");
        let header = b"P6\n12 9\n255\n";
        assert!(bytes.starts_with(header));
        assert_eq!(bytes.len(), header.len() + 12 * 9 * 3);
        assert_eq!(&bytes[header.len()..], frame.to_rgb_bytes().as_slice());
    }

    #[test]
    fn snapshot_writes_image_and_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("snapshots");
        let view = ViewState::centered_on(mandelbrot_shared::Complex::new(-0.75, 0.1), 8.0, 12, 9);
        let frame = render(&view, &params(), &SilentProgress).expect("render");

        let (manifest, manifest_path) =
            save_snapshot(&frame, &view, &params(), &out).expect("save");

        assert!(out.join(&manifest.image_file).exists());
        let loaded = read_manifest(&manifest_path).expect("read manifest");
        assert_eq!(loaded.id, manifest.id);
        assert_eq!(loaded.view, view);
        assert_eq!(loaded.palette, "fire");
        assert_eq!(loaded.pixel_hash, frame.pixel_hash());
    }

    #[test]
    fn manifest_reproduces_the_same_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        let view = ViewState::home(12, 9);
        let frame = render(&view, &params(), &SilentProgress).expect("render");
        let (_, manifest_path) =
            save_snapshot(&frame, &view, &params(), dir.path()).expect("save");

        let manifest = read_manifest(&manifest_path).expect("read");
        let replay_params = RenderParams::from_manifest(&manifest, 1).expect("params");
        let replay = render(&manifest.view, &replay_params, &SilentProgress).expect("render");
        assert_eq!(replay.pixel_hash(), manifest.pixel_hash);
    }

    #[test]
    fn newer_schema_versions_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let view = ViewState::home(12, 9);
        let frame = render(&view, &params(), &SilentProgress).expect("render");
        let mut manifest = build_manifest(&frame, &view, &params(), SnapshotId::new(), "x.ppm");
        manifest.schema_version = CURRENT_SCHEMA_VERSION + 1;

        let path = dir.path().join("future.json");
        write_manifest(&manifest, &path).expect("write");
        let err = read_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn missing_manifest_is_an_io_error() {
        let err = read_manifest(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(matches!(err, ViewerError::Io { .. }));
    }
}
