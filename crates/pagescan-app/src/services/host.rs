// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File-backed camera, full-frame edge detector, and directory assembler.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use pagescan_bridge::{AssemblyPage, DocumentAssembler, EdgeDetector, NativeCamera};
use pagescan_core::error::{Result, ScanError};
use pagescan_core::types::{Point, Quad};
use pagescan_document::ImageProcessor;
use serde::Serialize;
use tracing::{debug, info};

/// Hands out image files in order, one per capture.
pub struct FileCamera {
    queue: RefCell<VecDeque<PathBuf>>,
}

impl FileCamera {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            queue: RefCell::new(paths.into_iter().collect()),
        }
    }
}

impl NativeCamera for FileCamera {
    fn capture_page(&self) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.queue.borrow_mut().pop_front() else {
            return Ok(None);
        };
        let bytes = std::fs::read(&path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "page loaded from file");
        Ok(Some(bytes))
    }
}

/// Treats the whole frame as the page. Flatbed scans and pre-cropped photos
/// need nothing better; an empty frame counts as a failed detection.
pub struct FullFrameDetector;

impl EdgeDetector for FullFrameDetector {
    fn detect(&self, image: &DynamicImage) -> Option<Quad> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        let (w, h) = (image.width() as f32, image.height() as f32);
        Some(Quad {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(w, 0.0),
            bottom_left: Point::new(0.0, h),
            bottom_right: Point::new(w, h),
        })
    }
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    document: &'a str,
    pages: Vec<ManifestPage>,
}

#[derive(Debug, Serialize)]
struct ManifestPage {
    page_number: u32,
    rotation: u16,
    file: String,
}

/// Writes each page, turned upright, as a numbered JPEG into a folder named
/// after the document, alongside a `manifest.json`.
pub struct DirectoryAssembler {
    out_dir: PathBuf,
    extension: String,
    quality: f32,
}

impl DirectoryAssembler {
    pub fn new(out_dir: impl Into<PathBuf>, extension: impl Into<String>, quality: f32) -> Self {
        Self {
            out_dir: out_dir.into(),
            extension: extension.into(),
            quality,
        }
    }
}

/// Folder under `out_dir` that the pages of `file_name` are written into.
pub fn document_dir(out_dir: &Path, file_name: &str) -> PathBuf {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    out_dir.join(stem)
}

impl DocumentAssembler for DirectoryAssembler {
    fn extension(&self) -> &str {
        &self.extension
    }

    fn assemble(&self, pages: &[AssemblyPage], file_name: &str) -> Result<()> {
        if pages.is_empty() {
            return Err(ScanError::Assembly("no pages to assemble".into()));
        }
        let dir = document_dir(&self.out_dir, file_name);
        std::fs::create_dir_all(&dir)?;

        let mut manifest = Manifest {
            document: file_name,
            pages: Vec::with_capacity(pages.len()),
        };
        // Output files are numbered by position so gaps left by deletions
        // do not show up on disk.
        for (position, page) in pages.iter().enumerate() {
            let upright = ImageProcessor::from_bytes(&page.buffer)
                .map_err(|e| {
                    ScanError::Assembly(format!("page {} is unreadable: {e}", page.page_number))
                })?
                .rotate(page.rotation)
                .to_jpeg_bytes(self.quality)?;
            let file = format!("page-{:03}.jpg", position + 1);
            std::fs::write(dir.join(&file), &upright)?;
            manifest.pages.push(ManifestPage {
                page_number: page.page_number,
                rotation: page.rotation.degrees(),
                file,
            });
        }

        let json = serde_json::to_vec_pretty(&manifest)?;
        std::fs::write(dir.join("manifest.json"), json)?;
        info!(path = %dir.display(), pages = pages.len(), "document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use pagescan_core::types::Rotation;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([200]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn camera_reads_files_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.png");
        std::fs::write(&a, b"first").unwrap();
        std::fs::write(&b, b"second").unwrap();

        let camera = FileCamera::new([a, b]);
        assert_eq!(camera.capture_page().unwrap().unwrap(), b"first");
        assert_eq!(camera.capture_page().unwrap().unwrap(), b"second");
        assert_eq!(camera.capture_page().unwrap(), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let camera = FileCamera::new([PathBuf::from("/definitely/not/here.png")]);
        assert!(matches!(camera.capture_page(), Err(ScanError::Io(_))));
    }

    #[test]
    fn full_frame_quad() {
        let quad = FullFrameDetector
            .detect(&DynamicImage::new_luma8(40, 30))
            .unwrap();
        assert_eq!(quad.bottom_right, Point::new(40.0, 30.0));
        assert!(FullFrameDetector.detect(&DynamicImage::new_luma8(0, 0)).is_none());
    }

    #[test]
    fn assembler_writes_rotated_pages_and_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let assembler = DirectoryAssembler::new(tmp.path(), "pdf", 0.9);
        let pages = vec![
            AssemblyPage {
                page_number: 1,
                buffer: png(40, 20),
                rotation: Rotation::Deg90,
            },
            AssemblyPage {
                page_number: 4,
                buffer: png(40, 20),
                rotation: Rotation::Deg0,
            },
        ];
        assembler.assemble(&pages, "Acme Corp -.pdf").unwrap();

        let dir = tmp.path().join("Acme Corp -");
        let first = image::open(dir.join("page-001.jpg")).unwrap();
        assert_eq!((first.width(), first.height()), (20, 40));
        let second = image::open(dir.join("page-002.jpg")).unwrap();
        assert_eq!((second.width(), second.height()), (40, 20));

        let manifest: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.join("manifest.json")).unwrap()).unwrap();
        assert_eq!(manifest["document"], "Acme Corp -.pdf");
        assert_eq!(manifest["pages"][1]["page_number"], 4);
        assert_eq!(manifest["pages"][0]["rotation"], 90);
    }

    #[test]
    fn unreadable_page_fails_assembly() {
        let tmp = tempfile::tempdir().unwrap();
        let assembler = DirectoryAssembler::new(tmp.path(), "pdf", 0.9);
        let pages = vec![AssemblyPage {
            page_number: 2,
            buffer: b"junk".to_vec(),
            rotation: Rotation::Deg0,
        }];
        assert!(matches!(
            assembler.assemble(&pages, "x.pdf"),
            Err(ScanError::Assembly(_))
        ));
    }
}
