use std::path::{Path, PathBuf};

use image::Luma;
use ndarray::{s, Array2, Array3};
use tracing::{debug, warn};

use crate::error::{Result, VistuneError};
use crate::volume::ImagingStack;

/// TIFF files of a raw run directory, in acquisition (lexicographic) order.
pub fn list_raw_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("tif" | "tiff")
                )
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Load a grayscale image file, scaled to [0.0, 1.0].
pub fn load_plane(path: &Path) -> Result<Array2<f32>> {
    let img = image::open(path)?;
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    let mut data = Array2::<f32>::zeros((h as usize, w as usize));

    for row in 0..h as usize {
        for col in 0..w as usize {
            let pixel = gray.get_pixel(col as u32, row as u32);
            data[[row, col]] = pixel.0[0] as f32 / 65535.0;
        }
    }

    Ok(data)
}

/// Load a raw run. File `k` holds plane `k % planes` of frame `k / planes`;
/// a trailing incomplete volume is dropped.
pub fn load_run(dir: &Path, planes: usize) -> Result<ImagingStack> {
    if planes == 0 {
        return Err(VistuneError::Precondition("a run needs at least one plane".into()));
    }
    let files = list_raw_frames(dir)?;
    if files.len() < planes {
        return Err(VistuneError::NoFrames(dir.display().to_string()));
    }
    let frame_count = files.len() / planes;
    if files.len() % planes != 0 {
        warn!(
            files = files.len(),
            planes,
            "Dropping trailing incomplete volume"
        );
    }

    let mut frames = Vec::with_capacity(frame_count);
    for chunk in files.chunks_exact(planes) {
        let first = load_plane(&chunk[0])?;
        let (h, w) = first.dim();
        let mut volume = Array3::<f32>::zeros((h, w, planes));
        volume.slice_mut(s![.., .., 0]).assign(&first);
        for (p, path) in chunk.iter().enumerate().skip(1) {
            let plane = load_plane(path)?;
            if plane.dim() != (h, w) {
                return Err(VistuneError::ShapeMismatch(format!(
                    "{} is {:?}, expected {:?}",
                    path.display(),
                    plane.dim(),
                    (h, w)
                )));
            }
            volume.slice_mut(s![.., .., p]).assign(&plane);
        }
        frames.push(volume);
    }
    debug!(frames = frames.len(), planes, dir = %dir.display(), "Loaded raw run");
    ImagingStack::from_frames(&frames)
}

/// Save a plane as 16-bit grayscale TIFF.
pub fn save_plane_tiff(data: &Array2<f32>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();

    let pixels: Vec<u16> = data
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 65535.0) as u16)
        .collect();

    let img = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or_else(|| VistuneError::ShapeMismatch(format!("{}x{} buffer", w, h)))?;
    img.save(path)?;
    Ok(())
}

/// Write a (height, width, planes) image as `{name}_plane{p}.tif` files in `dir`.
pub fn write_volume_tiffs(volume: &Array3<f32>, dir: &Path, name: &str) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(volume.dim().2);
    for p in 0..volume.dim().2 {
        let path = dir.join(format!("{}_plane{}.tif", name, p));
        save_plane_tiff(&volume.slice(s![.., .., p]).to_owned(), &path)?;
        written.push(path);
    }
    debug!(name, planes = written.len(), "Wrote mean images");
    Ok(written)
}
